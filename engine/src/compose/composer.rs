//! # Network Composer
//!
//! One compose attempt, end to end: assemble the fee levels for the
//! attempt, dispatch on the ledger family, and collect one result per
//! level into a [`ComposedLevels`]. This is the only place the three
//! family strategies meet; everything above it (debounce, session)
//! is family-agnostic.

use tracing::debug;

use crate::account::{find_token, AccountView, Network, NetworkKind};
use crate::compose::account::compose_account;
use crate::compose::reserve::compose_reserve;
use crate::compose::result::ComposedLevels;
use crate::compose::utxo::shape_outputs;
use crate::fees::{fee_levels_for, FeeInfo, FeeLabel, FeeLevel};
use crate::form::output::OutputKind;
use crate::form::snapshot::FormSnapshot;
use crate::form::validate::find_valid_outputs;
use crate::provider::{ProviderError, TransactionProvider};

/// Composes candidates for one network.
pub struct NetworkComposer {
    network: Network,
}

impl NetworkComposer {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Run one attempt over the current form. Returns an empty level
    /// map when the form has nothing composable yet, or when a UTXO
    /// account holds no spendable coins; the session shows no fee
    /// display in those cases rather than an error.
    ///
    /// `Err` means the provider transport failed — every affordability
    /// or completeness outcome is inside the returned levels.
    pub async fn compose(
        &self,
        snapshot: &FormSnapshot,
        account: &AccountView,
        fee_info: &FeeInfo,
        provider: &dyn TransactionProvider,
    ) -> Result<ComposedLevels, ProviderError> {
        let token = find_token(&account.tokens, snapshot.token_contract.as_deref());
        let levels = attempt_levels(snapshot, &self.network, fee_info, token.is_some());

        debug!(
            symbol = %self.network.symbol,
            kind = ?self.network.kind,
            levels = levels.len(),
            "compose attempt"
        );

        match self.network.kind {
            NetworkKind::Utxo => {
                // No coins, nothing for the provider to select from.
                if account.utxo_count == 0 {
                    return Ok(ComposedLevels::default());
                }
                let shapes = shape_outputs(snapshot, &self.network);
                if shapes.is_empty() {
                    return Ok(ComposedLevels::default());
                }
                let results = provider.compose_candidates(account, &levels, &shapes).await?;
                if results.len() != levels.len() {
                    return Err(ProviderError::MalformedResponse(format!(
                        "expected {} level results, got {}",
                        levels.len(),
                        results.len()
                    )));
                }
                Ok(ComposedLevels::new(
                    levels
                        .iter()
                        .map(|l| l.label)
                        .zip(results)
                        .collect(),
                ))
            }
            NetworkKind::Account => {
                let (index, output) = match single_payment_line(snapshot) {
                    Some(line) => line,
                    None => return Ok(ComposedLevels::default()),
                };
                let max_active = snapshot.is_max_target(index);
                Ok(ComposedLevels::new(
                    levels
                        .iter()
                        .map(|level| {
                            (
                                level.label,
                                compose_account(
                                    account,
                                    &self.network,
                                    level,
                                    output,
                                    max_active,
                                    token,
                                ),
                            )
                        })
                        .collect(),
                ))
            }
            NetworkKind::Reserve => {
                let (index, output) = match single_payment_line(snapshot) {
                    Some(line) => line,
                    None => return Ok(ComposedLevels::default()),
                };
                let max_active = snapshot.is_max_target(index);
                Ok(ComposedLevels::new(
                    levels
                        .iter()
                        .map(|level| {
                            (
                                level.label,
                                compose_reserve(account, &self.network, level, output, max_active),
                            )
                        })
                        .collect(),
                ))
            }
        }
    }
}

/// The level set for one attempt: the fee source's tiers plus the
/// custom tier — but the custom tier participates only once the user
/// has actually priced it, and then carries the form's values.
fn attempt_levels(
    snapshot: &FormSnapshot,
    network: &Network,
    fee_info: &FeeInfo,
    token: bool,
) -> Vec<FeeLevel> {
    let mut levels = fee_levels_for(network, fee_info, token);
    if snapshot.fee_per_unit.is_empty() {
        levels.retain(|l| l.label != FeeLabel::Custom);
    } else {
        for level in levels.iter_mut().filter(|l| l.label == FeeLabel::Custom) {
            level.fee_per_unit = snapshot.fee_per_unit.clone();
            if !snapshot.fee_limit.is_empty() {
                level.fee_limit = Some(snapshot.fee_limit.clone());
            }
        }
    }
    levels
}

/// Single-balance ledgers spend through exactly one payment line: the
/// first valid one. Extra lines are a UTXO-family concept.
fn single_payment_line(snapshot: &FormSnapshot) -> Option<(usize, &crate::form::output::Output)> {
    find_valid_outputs(snapshot)
        .into_iter()
        .find(|(_, output)| output.kind == OutputKind::Payment)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
