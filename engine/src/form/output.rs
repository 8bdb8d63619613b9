//! # Form Outputs
//!
//! One payment line of the send form. Fields are plain strings in the
//! same shape the UI holds them — an empty string means the user hasn't
//! touched the field yet, and half-typed values are expected. The
//! composers decide what a partially-filled output *means*; this type
//! only records it.

use serde::{Deserialize, Serialize};

/// What kind of line this output is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// A destination + amount payment line.
    Payment,
    /// A data-carrier line (opreturn / memo); no destination, no value.
    OpReturn,
}

/// One payment line.
///
/// `id` is stable across add/remove operations — the UI keys rows on
/// it — while the output's *position* in the snapshot determines its
/// place in the candidate transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Stable identity, assigned once by the snapshot.
    pub id: u64,

    /// Payment or data line.
    pub kind: OutputKind,

    /// Destination address as typed. Empty = not entered yet.
    pub address: String,

    /// Amount in display units as typed. Empty = not entered yet.
    pub amount: String,

    /// Hex data payload for opreturn lines. Empty = not entered yet.
    pub data_hex: String,

    /// Mirrored fiat value of `amount`, display only.
    pub fiat: String,
}

impl Output {
    /// A fresh, untouched payment line.
    pub fn payment(id: u64) -> Self {
        Self {
            id,
            kind: OutputKind::Payment,
            address: String::new(),
            amount: String::new(),
            data_hex: String::new(),
            fiat: String::new(),
        }
    }

    /// A fresh, untouched data line.
    pub fn opreturn(id: u64) -> Self {
        Self {
            kind: OutputKind::OpReturn,
            ..Self::payment(id)
        }
    }

    /// True when the user has entered a destination.
    pub fn has_address(&self) -> bool {
        !self.address.is_empty()
    }

    /// True when the user has entered an amount.
    pub fn has_amount(&self) -> bool {
        !self.amount.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_outputs_are_empty() {
        let o = Output::payment(3);
        assert_eq!(o.id, 3);
        assert_eq!(o.kind, OutputKind::Payment);
        assert!(!o.has_address());
        assert!(!o.has_amount());

        let d = Output::opreturn(4);
        assert_eq!(d.kind, OutputKind::OpReturn);
        assert!(d.data_hex.is_empty());
    }
}
