//! # Account-Ledger Composition
//!
//! Account-based ledgers (single balance, metered computation) compose
//! locally — the fee is plain arithmetic, `fee_per_unit × fee_limit`,
//! with no coin selection to delegate. A transfer either moves native
//! currency or executes a token contract call; token transfers put the
//! value inside the encoded call data and send `0` native currency to
//! the token contract.
//!
//! Check order matters and is deliberate: affordability first, missing
//! destination second. A user who cannot afford the transfer learns
//! that immediately, before they bother typing an address.

use tracing::trace;

use crate::account::{AccountView, Network, TokenInfo};
use crate::amounts::{
    amount_to_base_units, calculate_fee, calculate_max, calculate_total, format_base_units,
    DecimalAmount,
};
use crate::compose::result::{
    CandidateOutput, CandidateTransaction, ComposeError, ComposeResult,
};
use crate::config::{CALL_PARAM_BYTES, TOKEN_TRANSFER_SELECTOR};
use crate::fees::FeeLevel;
use crate::form::output::Output;

/// Fee-unit budget of a plain native transfer.
const NATIVE_TRANSFER_FEE_LIMIT: &str = "21000";

// ---------------------------------------------------------------------------
// Token call encoding
// ---------------------------------------------------------------------------

/// Strip an optional `0x`/`0X` prefix.
pub fn sanitize_hex(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Encode a token `transfer(address,uint256)` call: 4-byte selector,
/// then recipient and amount each left-padded to one call parameter.
///
/// `None` when the recipient isn't hex or the amount isn't a plain
/// integer — the caller reports that as a data error, not a panic.
pub fn build_token_transfer(recipient: &str, amount_base_units: &str) -> Option<String> {
    let recipient = sanitize_hex(recipient).to_lowercase();
    if recipient.is_empty()
        || recipient.len() > CALL_PARAM_BYTES * 2
        || !recipient.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    let amount: u128 = amount_base_units.parse().ok()?;

    let width = CALL_PARAM_BYTES * 2;
    Some(format!(
        "0x{TOKEN_TRANSFER_SELECTOR}{recipient:0>width$}{amount:0>width$x}",
    ))
}

// ---------------------------------------------------------------------------
// compose
// ---------------------------------------------------------------------------

/// Compose one candidate at one fee level. `output` is the form's
/// single payment line; `max_active` marks it as the send-max target.
pub fn compose_account(
    account: &AccountView,
    network: &Network,
    level: &FeeLevel,
    output: &Output,
    max_active: bool,
    token: Option<&TokenInfo>,
) -> ComposeResult {
    let fee_limit = level
        .fee_limit
        .as_deref()
        .unwrap_or(NATIVE_TRANSFER_FEE_LIMIT)
        .to_string();
    let fee = calculate_fee(&level.fee_per_unit, &fee_limit);

    let available = parse_or_zero(&account.available_balance);
    let fee_amount = parse_or_zero(&fee);

    trace!(
        symbol = %network.symbol,
        level = %level.label,
        %fee,
        token = token.is_some(),
        "composing account candidate"
    );

    match token {
        Some(token) => {
            // Native balance pays the fee; the token amount rides in
            // the call data and is checked against the token balance.
            if fee_amount > available {
                return ComposeResult::error(ComposeError::NotEnoughCurrencyFee);
            }

            let max = format_base_units(&token.balance, token.decimals);
            let amount_base = if max_active {
                token.balance.clone()
            } else {
                amount_to_base_units(&output.amount, token.decimals)
                    .unwrap_or_else(|| "0".to_string())
            };
            if parse_or_zero(&amount_base) > parse_or_zero(&token.balance) {
                return ComposeResult::error(ComposeError::NotEnoughFunds);
            }

            if !output.has_address() {
                return ComposeResult::Nonfinal {
                    total_spent: fee.clone(),
                    fee,
                    fee_per_unit: level.fee_per_unit.clone(),
                    max: Some(max),
                };
            }

            let data_hex = match build_token_transfer(&output.address, &amount_base) {
                Some(data) => data,
                None => return ComposeResult::error(ComposeError::DataError),
            };
            ComposeResult::Final {
                total_spent: fee.clone(),
                fee,
                fee_per_unit: level.fee_per_unit.clone(),
                fee_limit: Some(fee_limit),
                max: Some(max),
                transaction: CandidateTransaction {
                    outputs: vec![CandidateOutput {
                        address: token.contract.clone(),
                        amount: "0".to_string(),
                    }],
                    data_hex: Some(data_hex),
                },
            }
        }
        None => {
            let max_base = calculate_max(&account.available_balance, &fee);
            let max = format_base_units(&max_base, network.decimals);
            let amount_base = if max_active {
                max_base
            } else {
                amount_to_base_units(&output.amount, network.decimals)
                    .unwrap_or_else(|| "0".to_string())
            };

            let total_spent = calculate_total(&amount_base, &fee);
            if parse_or_zero(&total_spent) > available {
                return ComposeResult::error(ComposeError::NotEnoughFunds);
            }

            if !output.has_address() {
                return ComposeResult::Nonfinal {
                    total_spent,
                    fee,
                    fee_per_unit: level.fee_per_unit.clone(),
                    max: Some(max),
                };
            }

            ComposeResult::Final {
                total_spent,
                fee,
                fee_per_unit: level.fee_per_unit.clone(),
                fee_limit: Some(fee_limit),
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
    }
}

fn parse_or_zero(s: &str) -> DecimalAmount {
    DecimalAmount::parse(s).unwrap_or(DecimalAmount::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
