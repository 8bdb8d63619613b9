//! # Compose Results
//!
//! The closed tagged union every composition attempt resolves to, and
//! the per-attempt map of fee level → result.
//!
//! The original form shipped these around as loosely-typed
//! `{ type: 'final' | 'nonfinal' | 'error' }` objects. Here the variants
//! are a real enum, exhaustively matched wherever consumed — a compose
//! attempt cannot be half-final.

use serde::{Deserialize, Serialize};

use crate::fees::FeeLabel;

// ---------------------------------------------------------------------------
// Error Codes
// ---------------------------------------------------------------------------

/// Reason code carried by [`ComposeResult::Error`].
///
/// These are *data*, not raised failures: an unaffordable transaction is
/// a valid answer to "can this be sent", and the user fixes it by
/// editing the form. Only transport failures escape as `Err` (see
/// [`crate::provider::ProviderError`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComposeError {
    /// Amount + fee exceeds the spendable balance.
    NotEnoughFunds,
    /// The token amount is affordable but the native-currency balance
    /// cannot cover the fee. Distinct from [`Self::NotEnoughFunds`] so
    /// the UI can say "top up ETH", not "lower the amount".
    NotEnoughCurrencyFee,
    /// A data payload (memo / opreturn / contract call) failed to encode.
    DataError,
    /// Synthetic resolver result: every fee level errored, so there is
    /// no level to fall back to.
    LevelsExhausted,
    /// Ledger-specific code passed through verbatim from the provider.
    Ledger(String),
}

impl ComposeError {
    /// The wire/UI reason code.
    pub fn code(&self) -> &str {
        match self {
            Self::NotEnoughFunds => "NOT-ENOUGH-FUNDS",
            Self::NotEnoughCurrencyFee => "NOT-ENOUGH-CURRENCY-FEE",
            Self::DataError => "DATA-ERROR",
            Self::LevelsExhausted => "LEVELS-EXHAUSTED",
            Self::Ledger(code) => code,
        }
    }
}

impl From<String> for ComposeError {
    fn from(code: String) -> Self {
        match code.as_str() {
            "NOT-ENOUGH-FUNDS" => Self::NotEnoughFunds,
            "NOT-ENOUGH-CURRENCY-FEE" => Self::NotEnoughCurrencyFee,
            "DATA-ERROR" => Self::DataError,
            "LEVELS-EXHAUSTED" => Self::LevelsExhausted,
            _ => Self::Ledger(code),
        }
    }
}

impl From<ComposeError> for String {
    fn from(err: ComposeError) -> Self {
        err.code().to_string()
    }
}

impl std::fmt::Display for ComposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Candidate Transaction
// ---------------------------------------------------------------------------

/// One resolved payment line of a signable candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOutput {
    /// Destination address (for token transfers, the contract address).
    pub address: String,
    /// Amount in smallest units. `"0"` for pure-data outputs and token
    /// transfers (the token amount rides in `data_hex`).
    pub amount: String,
}

/// The fully-resolved candidate handed to the signing provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTransaction {
    /// Resolved payment lines, in form order.
    pub outputs: Vec<CandidateOutput>,
    /// Encoded data payload (memo, opreturn, or token transfer call).
    pub data_hex: Option<String>,
}

// ---------------------------------------------------------------------------
// ComposeResult
// ---------------------------------------------------------------------------

/// The outcome of composing one candidate at one fee level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComposeResult {
    /// No destination yet, but fee and totals are computable — the form
    /// can already show "this will cost X".
    Nonfinal {
        /// Amount + fee in smallest units.
        total_spent: String,
        /// Fee in smallest units.
        fee: String,
        /// Fee price per unit, echoed for custom-fee seeding.
        fee_per_unit: String,
        /// Max spendable for a send-max output, display units.
        max: Option<String>,
    },
    /// Fully specified and signable.
    Final {
        /// Amount + fee in smallest units.
        total_spent: String,
        /// Fee in smallest units.
        fee: String,
        /// Fee price per unit, echoed for custom-fee seeding.
        fee_per_unit: String,
        /// Fee-unit budget, where the ledger meters computation.
        fee_limit: Option<String>,
        /// Max spendable for a send-max output, display units.
        max: Option<String>,
        /// The candidate to sign.
        transaction: CandidateTransaction,
    },
    /// Not sendable at this fee level; the reason is data, not a fault.
    Error {
        /// Why the candidate cannot be sent.
        error: ComposeError,
    },
}

impl ComposeResult {
    /// Shorthand for an error result.
    pub fn error(error: ComposeError) -> Self {
        Self::Error { error }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }

    /// Fee in smallest units; `None` for errors.
    pub fn fee(&self) -> Option<&str> {
        match self {
            Self::Nonfinal { fee, .. } | Self::Final { fee, .. } => Some(fee),
            Self::Error { .. } => None,
        }
    }

    /// Fee price per unit; `None` for errors.
    pub fn fee_per_unit(&self) -> Option<&str> {
        match self {
            Self::Nonfinal { fee_per_unit, .. } | Self::Final { fee_per_unit, .. } => {
                Some(fee_per_unit)
            }
            Self::Error { .. } => None,
        }
    }

    /// Max-spendable value; `None` for errors or when no send-max
    /// output participates.
    pub fn max(&self) -> Option<&str> {
        match self {
            Self::Nonfinal { max, .. } | Self::Final { max, .. } => max.as_deref(),
            Self::Error { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ComposedLevels
// ---------------------------------------------------------------------------

/// Fee label → result mapping for the *current* attempt.
///
/// Order matters: fallback scans levels in their defined order, so the
/// map preserves insertion order instead of hashing. A new attempt
/// replaces the whole value — stale levels must never survive next to
/// fresh ones, which is why there is no merge/insert API.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ComposedLevels {
    levels: Vec<(FeeLabel, ComposeResult)>,
}

impl ComposedLevels {
    /// Build the map for one attempt. Later duplicates of a label are
    /// ignored; the composer never produces them.
    pub fn new(levels: Vec<(FeeLabel, ComposeResult)>) -> Self {
        Self { levels }
    }

    /// Result for a given label, if the attempt covered it.
    pub fn get(&self, label: FeeLabel) -> Option<&ComposeResult> {
        self.levels
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, r)| r)
    }

    /// First level (in defined order) whose result is not an error.
    pub fn first_non_error(&self) -> Option<(FeeLabel, &ComposeResult)> {
        self.levels
            .iter()
            .find(|(_, r)| !r.is_error())
            .map(|(l, r)| (*l, r))
    }

    /// Iterate levels in defined order.
    pub fn iter(&self) -> impl Iterator<Item = (FeeLabel, &ComposeResult)> {
        self.levels.iter().map(|(l, r)| (*l, r))
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nonfinal(fee: &str) -> ComposeResult {
        ComposeResult::Nonfinal {
            total_spent: fee.to_string(),
            fee: fee.to_string(),
            fee_per_unit: "1".to_string(),
            max: None,
        }
    }

    #[test]
    fn error_codes_round_trip() {
        for err in [
            ComposeError::NotEnoughFunds,
            ComposeError::NotEnoughCurrencyFee,
            ComposeError::DataError,
            ComposeError::LevelsExhausted,
            ComposeError::Ledger("UTXO-LOCKED".to_string()),
        ] {
            let code = err.code().to_string();
            assert_eq!(ComposeError::from(code), err);
        }
    }

    #[test]
    fn result_serializes_with_type_tag() {
        let json = serde_json::to_value(ComposeResult::error(ComposeError::NotEnoughFunds))
            .expect("serialize");
        assert_eq!(json["type"], "error");
        assert_eq!(json["error"], "NOT-ENOUGH-FUNDS");

        let json = serde_json::to_value(nonfinal("10")).expect("serialize");
        assert_eq!(json["type"], "nonfinal");
    }

    #[test]
    fn levels_preserve_defined_order() {
        let composed = ComposedLevels::new(vec![
            (FeeLabel::Normal, ComposeResult::error(ComposeError::NotEnoughFunds)),
            (FeeLabel::Economy, nonfinal("5")),
            (FeeLabel::Low, nonfinal("1")),
        ]);

        assert_eq!(composed.len(), 3);
        assert!(composed.get(FeeLabel::Normal).unwrap().is_error());
        let (label, result) = composed.first_non_error().expect("economy composes");
        assert_eq!(label, FeeLabel::Economy);
        assert_eq!(result.fee(), Some("5"));
    }

    #[test]
    fn get_unknown_label_is_none() {
        let composed = ComposedLevels::new(vec![(FeeLabel::Normal, nonfinal("2"))]);
        assert!(composed.get(FeeLabel::Custom).is_none());
    }
}
