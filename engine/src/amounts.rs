//! # Amount Math
//!
//! Exact decimal arithmetic for totals, max-spendable and fee values.
//! Amounts travel through the engine as decimal strings (the same form
//! they have in the UI and on the wire), and every operation here goes
//! through [`DecimalAmount`] — an unsigned u128 fixed-point value.
//!
//! ## Rules
//!
//! 1. **No floating point.** Ever. A send form that rounds satoshis is
//!    a send form that loses money.
//! 2. **Malformed input never panics.** The string helpers return `"0"`
//!    for garbage — the original form treats an unparseable amount as
//!    "nothing to spend", and validation reports the real error
//!    separately.
//! 3. **Amounts are non-negative.** Subtraction clamps at zero
//!    ([`calculate_max`]) or reports `None` ([`DecimalAmount::checked_sub`]).

use crate::config::FIAT_DECIMALS;

// ---------------------------------------------------------------------------
// DecimalAmount
// ---------------------------------------------------------------------------

/// An unsigned fixed-point decimal: `units * 10^-scale`.
///
/// 38 significant digits (u128) is far beyond any ledger amount we
/// handle — 21 million BTC in satoshi is 16 digits, total wei supply is
/// 27. Overflow is still checked everywhere, because "can't happen"
/// amounts arrive from user input.
#[derive(Clone, Copy, Debug)]
pub struct DecimalAmount {
    units: u128,
    scale: u32,
}

/// Largest exponent for which `10^n` fits in a u128.
const MAX_POW10: u32 = 38;

fn pow10(n: u32) -> Option<u128> {
    if n > MAX_POW10 {
        return None;
    }
    10u128.checked_pow(n)
}

impl DecimalAmount {
    /// The zero amount.
    pub const ZERO: DecimalAmount = DecimalAmount { units: 0, scale: 0 };

    /// Parse a plain decimal string: digits, at most one `.`, no sign,
    /// no exponent, no separators. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        // "1." and ".5" are accepted by most UIs mid-edit; reject only
        // when both sides are empty or contain non-digits.
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if frac.contains('.') {
            return None;
        }
        let scale = frac.len() as u32;
        let mut units: u128 = 0;
        for b in whole.bytes().chain(frac.bytes()) {
            units = units
                .checked_mul(10)?
                .checked_add(u128::from(b - b'0'))?;
        }
        Some(Self { units, scale })
    }

    /// True when the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    /// Rescale to a larger scale. `None` if the target is smaller than
    /// the current scale or the shifted units overflow.
    fn rescale_up(&self, scale: u32) -> Option<Self> {
        if scale < self.scale {
            return None;
        }
        let factor = pow10(scale - self.scale)?;
        Some(Self {
            units: self.units.checked_mul(factor)?,
            scale,
        })
    }

    /// Align two amounts to a common scale.
    fn aligned(a: Self, b: Self) -> Option<(Self, Self)> {
        let scale = a.scale.max(b.scale);
        Some((a.rescale_up(scale)?, b.rescale_up(scale)?))
    }

    /// Exact addition.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let (a, b) = Self::aligned(self, other)?;
        Some(Self {
            units: a.units.checked_add(b.units)?,
            scale: a.scale,
        })
    }

    /// Exact subtraction; `None` when the result would be negative.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        let (a, b) = Self::aligned(self, other)?;
        Some(Self {
            units: a.units.checked_sub(b.units)?,
            scale: a.scale,
        })
    }

    /// Exact multiplication.
    pub fn checked_mul(self, other: Self) -> Option<Self> {
        Some(Self {
            units: self.units.checked_mul(other.units)?,
            scale: self.scale.checked_add(other.scale)?,
        })
    }

    /// Number of fractional digits carried after trimming trailing zeros.
    pub fn fraction_digits(&self) -> u32 {
        let mut units = self.units;
        let mut scale = self.scale;
        while scale > 0 && units % 10 == 0 {
            units /= 10;
            scale -= 1;
        }
        scale
    }

    /// Round half-up to `scale` fractional digits.
    pub fn round_to(self, scale: u32) -> Option<Self> {
        if scale >= self.scale {
            return self.rescale_up(scale);
        }
        let factor = pow10(self.scale - scale)?;
        let half = factor / 2;
        let units = self.units.checked_add(half)? / factor;
        Some(Self { units, scale })
    }
}

impl PartialEq for DecimalAmount {
    /// Value equality — `1.50 == 1.5`. Alignment overflow (astronomical
    /// scales) compares unequal rather than panicking.
    fn eq(&self, other: &Self) -> bool {
        matches!(
            self.partial_cmp(other),
            Some(std::cmp::Ordering::Equal)
        )
    }
}

impl PartialOrd for DecimalAmount {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let (a, b) = Self::aligned(*self, *other)?;
        Some(a.units.cmp(&b.units))
    }
}

impl std::fmt::Display for DecimalAmount {
    /// Canonical form: no leading zeros, trailing fraction zeros trimmed,
    /// `"0"` for zero.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.units.to_string();
        if self.scale == 0 {
            return f.write_str(&digits);
        }
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let (whole, frac) = padded.split_at(padded.len() - scale);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            f.write_str(whole)
        } else {
            write!(f, "{whole}.{frac}")
        }
    }
}

// ---------------------------------------------------------------------------
// String helpers — the form-facing API
// ---------------------------------------------------------------------------

/// Total spent for a payment: `amount + fee`, exactly.
///
/// Returns `"0"` when either input is malformed — the caller's field
/// validation owns reporting that, not the math.
pub fn calculate_total(amount: &str, fee: &str) -> String {
    match (DecimalAmount::parse(amount), DecimalAmount::parse(fee)) {
        (Some(a), Some(f)) => a
            .checked_add(f)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "0".to_string()),
        _ => "0".to_string(),
    }
}

/// Max spendable: `max(balance - fee, 0)`.
///
/// Returns `"0"` for malformed input or when the fee exceeds the balance.
pub fn calculate_max(balance: &str, fee: &str) -> String {
    match (DecimalAmount::parse(balance), DecimalAmount::parse(fee)) {
        (Some(b), Some(f)) => b
            .checked_sub(f)
            .map(|m| m.to_string())
            .unwrap_or_else(|| "0".to_string()),
        _ => "0".to_string(),
    }
}

/// Fee for a metered-computation ledger: `fee_per_unit * fee_limit`.
///
/// Either input missing or malformed yields `"0"` — the form renders
/// that as "fee unknown" rather than blowing up mid-edit.
pub fn calculate_fee(fee_per_unit: &str, fee_limit: &str) -> String {
    match (
        DecimalAmount::parse(fee_per_unit),
        DecimalAmount::parse(fee_limit),
    ) {
        (Some(p), Some(l)) => p
            .checked_mul(l)
            .map(|f| f.to_string())
            .unwrap_or_else(|| "0".to_string()),
        _ => "0".to_string(),
    }
}

/// Convert a display-unit amount to an integer smallest-unit string.
///
/// `None` when the amount is malformed, carries more fractional digits
/// than the network supports, or overflows.
pub fn amount_to_base_units(amount: &str, decimals: u32) -> Option<String> {
    let value = DecimalAmount::parse(amount)?;
    if value.fraction_digits() > decimals {
        return None;
    }
    let base = value.round_to(decimals)?;
    // At scale == decimals, `units` *is* the smallest-unit integer.
    Some(base.units.to_string())
}

/// Convert an integer smallest-unit string back to display units.
///
/// Malformed input yields `"0"`, matching the other helpers.
pub fn format_base_units(base: &str, decimals: u32) -> String {
    match DecimalAmount::parse(base) {
        Some(v) if v.scale == 0 => DecimalAmount {
            units: v.units,
            scale: decimals,
        }
        .to_string(),
        _ => "0".to_string(),
    }
}

/// Mirror a display-unit amount into fiat: `amount * rate`, rounded
/// half-up to [`FIAT_DECIMALS`].
///
/// `None` when the rate is absent or either value is malformed — the
/// form simply shows no fiat, which is the graceful-degradation
/// contract for the rate source.
pub fn to_fiat(amount: &str, rate: Option<&str>) -> Option<String> {
    let rate = DecimalAmount::parse(rate?)?;
    let amount = DecimalAmount::parse(amount)?;
    let product = amount.checked_mul(rate)?;
    Some(product.round_to(FIAT_DECIMALS)?.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plain_decimals() {
        assert_eq!(DecimalAmount::parse("0").unwrap().to_string(), "0");
        assert_eq!(DecimalAmount::parse("1.5").unwrap().to_string(), "1.5");
        assert_eq!(DecimalAmount::parse("00.10").unwrap().to_string(), "0.1");
        assert_eq!(DecimalAmount::parse(".5").unwrap().to_string(), "0.5");
        assert_eq!(DecimalAmount::parse("7.").unwrap().to_string(), "7");
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", " ", "abc", "-1", "+1", "1.2.3", "1e5", "0x10", "1,000"] {
            assert!(DecimalAmount::parse(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn calculate_total_adds_exactly() {
        assert_eq!(calculate_total("1", "2"), "3");
        assert_eq!(calculate_total("0.1", "0.2"), "0.3");
        assert_eq!(
            calculate_total("12345678901234567890", "1"),
            "12345678901234567891"
        );
    }

    #[test]
    fn calculate_total_malformed_is_zero() {
        assert_eq!(calculate_total("", "2"), "0");
        assert_eq!(calculate_total("abc", "2"), "0");
        assert_eq!(calculate_total("1", "NaN"), "0");
    }

    #[test]
    fn calculate_max_subtracts_and_clamps() {
        assert_eq!(calculate_max("2", "1"), "1");
        assert_eq!(calculate_max("1", "5"), "0");
        assert_eq!(calculate_max("1.5", "0.5"), "1");
    }

    #[test]
    fn calculate_max_malformed_is_zero() {
        assert_eq!(calculate_max("x", "1"), "0");
        assert_eq!(calculate_max("1", ""), "0");
    }

    #[test]
    fn calculate_fee_multiplies() {
        assert_eq!(calculate_fee("2", "3"), "6");
        assert_eq!(calculate_fee("1.5", "2"), "3");
        assert_eq!(calculate_fee("20000000000", "21000"), "420000000000000");
    }

    #[test]
    fn calculate_fee_missing_input_is_zero() {
        assert_eq!(calculate_fee("", "21000"), "0");
        assert_eq!(calculate_fee("20", ""), "0");
        assert_eq!(calculate_fee("NaN", "21000"), "0");
    }

    #[test]
    fn base_unit_round_trip() {
        assert_eq!(amount_to_base_units("1", 8).unwrap(), "100000000");
        assert_eq!(amount_to_base_units("0.00000001", 8).unwrap(), "1");
        assert_eq!(format_base_units("100000000", 8), "1");
        assert_eq!(format_base_units("1", 8), "0.00000001");
        assert_eq!(format_base_units("150000000", 8), "1.5");
    }

    #[test]
    fn base_units_reject_excess_precision() {
        assert!(amount_to_base_units("0.0000000001", 8).is_none());
        assert!(amount_to_base_units("nope", 8).is_none());
    }

    #[test]
    fn format_base_units_rejects_fractions() {
        assert_eq!(format_base_units("1.5", 8), "0");
        assert_eq!(format_base_units("", 8), "0");
    }

    #[test]
    fn fiat_mirror_rounds_half_up() {
        assert_eq!(to_fiat("1", Some("9500.5")).unwrap(), "9500.5");
        assert_eq!(to_fiat("0.333", Some("3")).unwrap(), "1");
        assert_eq!(to_fiat("1", Some("0.005")).unwrap(), "0.01");
    }

    #[test]
    fn fiat_mirror_degrades_gracefully() {
        assert!(to_fiat("1", None).is_none());
        assert!(to_fiat("abc", Some("1")).is_none());
        assert!(to_fiat("1", Some("abc")).is_none());
    }

    #[test]
    fn comparison_aligns_scales() {
        let a = DecimalAmount::parse("1.50").unwrap();
        let b = DecimalAmount::parse("1.5").unwrap();
        assert_eq!(a, b);
        assert!(DecimalAmount::parse("2").unwrap() > DecimalAmount::parse("1.999").unwrap());
    }
}
