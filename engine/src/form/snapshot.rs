//! # Form Snapshot
//!
//! The complete state of the send form at one instant: the ordered
//! output lines, the send-max designation, the selected fee tier and
//! the network-specific extras. The session owns exactly one snapshot
//! and publishes immutable clones to observers; everything here mutates
//! through named operations so there is a single word for every thing
//! an edit can do.
//!
//! Invariant: at most one output is the send-max target. Encoded in the
//! type — `set_max_output_id` is an `Option<usize>`, not a per-output
//! flag, so two targets cannot exist by construction.

use serde::{Deserialize, Serialize};

use crate::config::MAX_FORM_OUTPUTS;
use crate::fees::{FeeLabel, FeeLevel};

use super::output::{Output, OutputKind};

/// The form state for one composition session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSnapshot {
    /// Payment lines in candidate-transaction order.
    pub outputs: Vec<Output>,

    /// Index of the output absorbing all spendable balance, if any.
    pub set_max_output_id: Option<usize>,

    /// Fee tier the user (or the resolver fallback) selected.
    pub selected_fee: Option<FeeLabel>,

    /// Custom fee-per-unit input. Empty until the user switches to the
    /// custom tier (then seeded from the previously active tier).
    pub fee_per_unit: String,

    /// Custom fee-unit budget input (gas-limit analogue).
    pub fee_limit: String,

    /// Lock time (block height) for UTXO networks. Empty = none.
    pub lock_time: String,

    /// Destination tag for reserve-based networks. Empty = none.
    pub destination_tag: String,

    /// Token contract to transfer, for account-based networks.
    /// `None` = native currency.
    pub token_contract: Option<String>,

    /// Next stable output id. Never reused within a snapshot's lifetime.
    next_output_id: u64,
}

impl Default for FormSnapshot {
    /// A fresh form: one empty payment line, nothing selected.
    fn default() -> Self {
        Self {
            outputs: vec![Output::payment(0)],
            set_max_output_id: None,
            selected_fee: None,
            fee_per_unit: String::new(),
            fee_limit: String::new(),
            lock_time: String::new(),
            destination_tag: String::new(),
            token_contract: None,
            next_output_id: 1,
        }
    }
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Output operations --------------------------------------------------

    /// Append a fresh payment line. Returns its index, or `None` when
    /// the form is at capacity.
    pub fn add_output(&mut self) -> Option<usize> {
        self.push_output(OutputKind::Payment)
    }

    /// Append a fresh opreturn line. Returns its index, or `None` when
    /// the form is at capacity.
    pub fn add_opreturn(&mut self) -> Option<usize> {
        self.push_output(OutputKind::OpReturn)
    }

    fn push_output(&mut self, kind: OutputKind) -> Option<usize> {
        if self.outputs.len() >= MAX_FORM_OUTPUTS {
            return None;
        }
        let id = self.next_output_id;
        self.next_output_id += 1;
        self.outputs.push(match kind {
            OutputKind::Payment => Output::payment(id),
            OutputKind::OpReturn => Output::opreturn(id),
        });
        Some(self.outputs.len() - 1)
    }

    /// Remove the output at `index`, keeping the send-max designation
    /// pointing at the same *line*: a target above the removed index
    /// shifts down with its output, and removing the target itself
    /// clears the designation.
    pub fn remove_output(&mut self, index: usize) {
        if index >= self.outputs.len() {
            return;
        }
        match self.set_max_output_id {
            Some(target) if target == index => self.set_max_output_id = None,
            Some(target) if target > index => self.set_max_output_id = Some(target - 1),
            _ => {}
        }
        self.outputs.remove(index);
    }

    pub fn set_address(&mut self, index: usize, address: impl Into<String>) {
        if let Some(output) = self.outputs.get_mut(index) {
            output.address = address.into();
        }
    }

    pub fn set_amount(&mut self, index: usize, amount: impl Into<String>) {
        if let Some(output) = self.outputs.get_mut(index) {
            output.amount = amount.into();
        }
    }

    pub fn set_fiat(&mut self, index: usize, fiat: impl Into<String>) {
        if let Some(output) = self.outputs.get_mut(index) {
            output.fiat = fiat.into();
        }
    }

    pub fn set_data_hex(&mut self, index: usize, data_hex: impl Into<String>) {
        if let Some(output) = self.outputs.get_mut(index) {
            output.data_hex = data_hex.into();
        }
    }

    /// Designate (or clear) the single send-max output. Out-of-range
    /// indices clear the designation rather than dangling.
    pub fn set_max_target(&mut self, index: Option<usize>) {
        self.set_max_output_id = index.filter(|i| *i < self.outputs.len());
    }

    /// True when `index` is the send-max target.
    pub fn is_max_target(&self, index: usize) -> bool {
        self.set_max_output_id == Some(index)
    }

    // -- Fee operations -----------------------------------------------------

    /// Switch the selected fee tier.
    ///
    /// On the *first* switch to the custom tier, the custom fee input is
    /// seeded from the tier that was active immediately before — a value
    /// the user already typed is never overwritten.
    pub fn select_fee(&mut self, label: FeeLabel, previous: Option<&FeeLevel>) {
        if label == FeeLabel::Custom && self.fee_per_unit.is_empty() {
            if let Some(level) = previous {
                self.fee_per_unit = level.fee_per_unit.clone();
                if let Some(limit) = &level.fee_limit {
                    self.fee_limit = limit.clone();
                }
            }
        }
        self.selected_fee = Some(label);
    }

    pub fn set_custom_fee(&mut self, fee_per_unit: impl Into<String>) {
        self.fee_per_unit = fee_per_unit.into();
    }

    pub fn set_fee_limit(&mut self, fee_limit: impl Into<String>) {
        self.fee_limit = fee_limit.into();
    }

    // -- Network-specific fields --------------------------------------------

    pub fn set_lock_time(&mut self, lock_time: impl Into<String>) {
        self.lock_time = lock_time.into();
    }

    pub fn set_destination_tag(&mut self, tag: impl Into<String>) {
        self.destination_tag = tag.into();
    }

    pub fn set_token_contract(&mut self, contract: Option<String>) {
        self.token_contract = contract;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
