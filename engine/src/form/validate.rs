//! # Field Validation
//!
//! Local checks over a [`FormSnapshot`] — everything that can be judged
//! without touching the ledger. Amount affordability is *not* checked
//! here; that is the composers' answer, delivered as compose-kind
//! errors. Validation runs on every edit and its errors block
//! composition outright: a form that fails a field check composes
//! nothing until the offending field is fixed. Untouched fields are
//! exempt, so a fresh form with empty amounts still validates.

use crate::account::Network;
use crate::amounts::{amount_to_base_units, DecimalAmount};
use crate::config::{MAX_ADDRESS_LENGTH, MAX_BLOCK_LOCK_TIME, MAX_DATA_PAYLOAD_BYTES};
use crate::fees::{FeeInfo, FeeLabel};

use super::errors::{ErrorKind, FormErrors};
use super::output::{Output, OutputKind};
use super::snapshot::FormSnapshot;

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Validate every touched field of the snapshot. Untouched (empty)
/// fields produce no errors — a fresh form is valid, just not sendable.
pub fn validate(snapshot: &FormSnapshot, network: &Network, fee_info: &FeeInfo) -> FormErrors {
    let mut errors = FormErrors::new();

    for (index, output) in snapshot.outputs.iter().enumerate() {
        match output.kind {
            OutputKind::Payment => {
                validate_address(&mut errors, index, output);
                validate_amount(&mut errors, index, output, network);
            }
            OutputKind::OpReturn => validate_data(&mut errors, index, output),
        }
    }

    validate_lock_time(&mut errors, snapshot);
    validate_destination_tag(&mut errors, snapshot);
    validate_custom_fee(&mut errors, snapshot, fee_info);

    errors
}

fn validate_address(errors: &mut FormErrors, index: usize, output: &Output) {
    if output.address.is_empty() {
        return;
    }
    let shape_ok = output.address.len() <= MAX_ADDRESS_LENGTH
        && output.address.bytes().all(|b| b.is_ascii_alphanumeric());
    if !shape_ok {
        errors.set_output_field(index, "address", ErrorKind::Validate, "ADDRESS-INVALID");
    }
}

fn validate_amount(errors: &mut FormErrors, index: usize, output: &Output, network: &Network) {
    if output.amount.is_empty() {
        return;
    }
    let value = match DecimalAmount::parse(&output.amount) {
        Some(value) => value,
        None => {
            errors.set_output_field(index, "amount", ErrorKind::Validate, "AMOUNT-INVALID");
            return;
        }
    };
    if value.fraction_digits() > network.decimals {
        errors.set_output_field(index, "amount", ErrorKind::Validate, "AMOUNT-PRECISION");
        return;
    }
    if value.is_zero() {
        return;
    }
    let dust = DecimalAmount::parse(&network.dust_limit).unwrap_or(DecimalAmount::ZERO);
    if dust.is_zero() {
        return;
    }
    let below_dust = amount_to_base_units(&output.amount, network.decimals)
        .and_then(|base| DecimalAmount::parse(&base))
        .map_or(false, |base| base < dust);
    if below_dust {
        errors.set_output_field(index, "amount", ErrorKind::Validate, "AMOUNT-BELOW-DUST");
    }
}

fn validate_data(errors: &mut FormErrors, index: usize, output: &Output) {
    if output.data_hex.is_empty() {
        return;
    }
    match hex::decode(&output.data_hex) {
        Ok(bytes) if bytes.len() <= MAX_DATA_PAYLOAD_BYTES => {}
        _ => errors.set_output_field(index, "dataHex", ErrorKind::Validate, "DATA-INVALID"),
    }
}

fn validate_lock_time(errors: &mut FormErrors, snapshot: &FormSnapshot) {
    if snapshot.lock_time.is_empty() {
        return;
    }
    match snapshot.lock_time.parse::<u64>() {
        Ok(height) if height <= MAX_BLOCK_LOCK_TIME => {}
        _ => errors.set_field("lockTime", ErrorKind::Validate, "LOCKTIME-OUT-OF-RANGE"),
    }
}

fn validate_destination_tag(errors: &mut FormErrors, snapshot: &FormSnapshot) {
    if snapshot.destination_tag.is_empty() {
        return;
    }
    if snapshot.destination_tag.parse::<u32>().is_err() {
        errors.set_field(
            "destinationTag",
            ErrorKind::Validate,
            "DESTINATION-TAG-INVALID",
        );
    }
}

fn validate_custom_fee(errors: &mut FormErrors, snapshot: &FormSnapshot, fee_info: &FeeInfo) {
    if snapshot.selected_fee != Some(FeeLabel::Custom) || snapshot.fee_per_unit.is_empty() {
        return;
    }
    let in_range = DecimalAmount::parse(&snapshot.fee_per_unit).map_or(false, |fee| {
        let min = DecimalAmount::parse(&fee_info.min_fee.to_string())
            .unwrap_or(DecimalAmount::ZERO);
        let max = DecimalAmount::parse(&fee_info.max_fee.to_string())
            .unwrap_or(DecimalAmount::ZERO);
        fee >= min && fee <= max
    });
    if !in_range {
        errors.set_field("feePerUnit", ErrorKind::Validate, "FEE-OUT-OF-RANGE");
    }
}

// ---------------------------------------------------------------------------
// Compose eligibility
// ---------------------------------------------------------------------------

/// The outputs a compose attempt may use, with their form indices.
///
/// A payment line participates once it has an amount *or* is the
/// send-max target (amount is then derived); a data line participates
/// once it carries a payload. Everything else is still being typed and
/// is ignored, not rejected.
pub fn find_valid_outputs<'a>(snapshot: &'a FormSnapshot) -> Vec<(usize, &'a Output)> {
    snapshot
        .outputs
        .iter()
        .enumerate()
        .filter(|(index, output)| match output.kind {
            OutputKind::Payment => output.has_amount() || snapshot.is_max_target(*index),
            OutputKind::OpReturn => !output.data_hex.is_empty(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
