//! # Reserve-Ledger Composition
//!
//! Reserve-based ledgers (single balance, mandatory retained minimum)
//! are the simplest family: the fee is the level's per-unit price taken
//! flat, and the reserve is already deducted from the account's
//! available balance upstream. Composition is pure arithmetic.
//!
//! Unlike the account family, a missing destination is reported *before*
//! affordability: these ledgers burn the reserve of a destination that
//! doesn't exist yet, so the destination is the first thing the user
//! must get right.

use tracing::trace;

use crate::account::{AccountView, Network};
use crate::amounts::{
    amount_to_base_units, calculate_max, calculate_total, format_base_units, DecimalAmount,
};
use crate::compose::result::{
    CandidateOutput, CandidateTransaction, ComposeError, ComposeResult,
};
use crate::fees::FeeLevel;
use crate::form::output::Output;

/// Compose one candidate at one fee level. `output` is the form's
/// single payment line; `max_active` marks it as the send-max target.
pub fn compose_reserve(
    account: &AccountView,
    network: &Network,
    level: &FeeLevel,
    output: &Output,
    max_active: bool,
) -> ComposeResult {
    // Flat fee: the per-unit price *is* the fee on these ledgers.
    let fee = level.fee_per_unit.clone();

    trace!(symbol = %network.symbol, level = %level.label, %fee, "composing reserve candidate");

    let max_base = calculate_max(&account.available_balance, &fee);
    let max = format_base_units(&max_base, network.decimals);
    let amount_base = if max_active {
        max_base
    } else {
        amount_to_base_units(&output.amount, network.decimals).unwrap_or_else(|| "0".to_string())
    };
    let total_spent = calculate_total(&amount_base, &fee);

    if !output.has_address() {
        return ComposeResult::Nonfinal {
            total_spent,
            fee,
            fee_per_unit: level.fee_per_unit.clone(),
            max: Some(max),
        };
    }

    let available =
        DecimalAmount::parse(&account.available_balance).unwrap_or(DecimalAmount::ZERO);
    let total = DecimalAmount::parse(&total_spent).unwrap_or(DecimalAmount::ZERO);
    if total > available {
        return ComposeResult::error(ComposeError::NotEnoughFunds);
    }

    ComposeResult::Final {
        total_spent,
        fee,
        fee_per_unit: level.fee_per_unit.clone(),
        fee_limit: None,
        max: Some(max),
        transaction: CandidateTransaction {
            outputs: vec![CandidateOutput {
                address: output.address.clone(),
                amount: amount_base,
            }],
            data_hex: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
