//! # UTXO Composition
//!
//! On UTXO ledgers the engine does not select coins — the external
//! provider does. The engine's job is to translate form outputs into
//! the provider's output-shape vocabulary, hand over every fee level in
//! one round trip, and classify what comes back.
//!
//! Shaping encodes *completeness*: an output with both address and
//! amount is `External` (can become final); an amount without an
//! address is `NoAddress` (fee is computable, candidate is not
//! signable). The send-max target gets its own pair of shapes because
//! its amount is derived by the provider, not typed.

use serde::{Deserialize, Serialize};

use crate::account::Network;
use crate::amounts::amount_to_base_units;
use crate::form::output::OutputKind;
use crate::form::snapshot::FormSnapshot;
use crate::form::validate::find_valid_outputs;

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

/// One form output translated for the coin-selecting provider.
/// Amounts are smallest-unit strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ComposeOutputShape {
    /// Complete payment: address and amount both known.
    External { address: String, amount: String },
    /// Send-max with a known destination.
    SendMax { address: String },
    /// Amount known, destination still blank — compose for the fee
    /// display only.
    NoAddress { amount: String },
    /// Send-max with no destination yet.
    SendMaxNoAddress,
    /// Data carrier; no value, no destination.
    OpReturn { data_hex: String },
}

impl ComposeOutputShape {
    /// True when the shape carries a destination, i.e. can participate
    /// in a final (signable) candidate.
    pub fn is_addressed(&self) -> bool {
        matches!(self, Self::External { .. } | Self::SendMax { .. })
    }

    /// The address-less rendition of this shape.
    fn demoted(self) -> Self {
        match self {
            Self::External { amount, .. } => Self::NoAddress { amount },
            Self::SendMax { .. } => Self::SendMaxNoAddress,
            other => other,
        }
    }
}

/// Translate the form's usable outputs into provider shapes.
///
/// Returns an empty vector when nothing is composable yet (no amounts,
/// no send-max, no data) — the caller skips the attempt entirely.
///
/// Corner case: when some *other* payment line has a destination typed
/// but no amount yet, the form as a whole is incomplete, so the first
/// addressed shape is demoted to its address-less form. One address-less
/// shape keeps the whole attempt non-final, so it yields fee estimates
/// without ever producing a final candidate that silently drops the
/// half-finished line.
pub fn shape_outputs(snapshot: &FormSnapshot, network: &Network) -> Vec<ComposeOutputShape> {
    let valid = find_valid_outputs(snapshot);
    let mut shapes = Vec::with_capacity(valid.len());

    for (index, output) in &valid {
        let shape = match output.kind {
            OutputKind::OpReturn => ComposeOutputShape::OpReturn {
                data_hex: output.data_hex.clone(),
            },
            OutputKind::Payment => {
                let max_active = snapshot.is_max_target(*index);
                if max_active {
                    if output.has_address() {
                        ComposeOutputShape::SendMax {
                            address: output.address.clone(),
                        }
                    } else {
                        ComposeOutputShape::SendMaxNoAddress
                    }
                } else {
                    let amount = match amount_to_base_units(&output.amount, network.decimals) {
                        Some(amount) => amount,
                        // Unparseable amounts are validation's problem;
                        // the line just doesn't compose.
                        None => continue,
                    };
                    if output.has_address() {
                        ComposeOutputShape::External {
                            address: output.address.clone(),
                            amount,
                        }
                    } else {
                        ComposeOutputShape::NoAddress { amount }
                    }
                }
            }
        };
        shapes.push(shape);
    }

    let has_incomplete_line = snapshot.outputs.iter().enumerate().any(|(index, output)| {
        output.kind == OutputKind::Payment
            && output.has_address()
            && !output.has_amount()
            && !snapshot.is_max_target(index)
    });
    if has_incomplete_line {
        if let Some(pos) = shapes.iter().position(ComposeOutputShape::is_addressed) {
            shapes[pos] = shapes[pos].clone().demoted();
        }
    }

    shapes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
