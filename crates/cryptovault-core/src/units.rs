//! Conversions between smallest units and decimal display strings.
//!
//! Integer arithmetic only; amounts never pass through floating point.

use crate::chain::Chain;
use crate::error::UnitsError;

fn pow10(decimals: u32) -> u128 {
    10u128.pow(decimals)
}

/// Render `amount` smallest units as a decimal string with `decimals`
/// fractional digits, trailing zeros trimmed.
///
/// `format_units(150_000_000, 8) == "1.5"`, `format_units(0, 8) == "0"`.
pub fn format_units(amount: u128, decimals: u32) -> String {
    let scale = pow10(decimals);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = decimals as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Parse a decimal string into smallest units.
///
/// Rejects signs, exponents, more than `decimals` fractional digits and
/// values that overflow `u128`.
pub fn parse_units(s: &str, decimals: u32) -> Result<u128, UnitsError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::Invalid(s.to_string()));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UnitsError::Invalid(s.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(UnitsError::TooPrecise { max: decimals });
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| UnitsError::Overflow)?
    };
    let frac_value: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        padded.parse().map_err(|_| UnitsError::Overflow)?
    };

    whole
        .checked_mul(pow10(decimals))
        .and_then(|v| v.checked_add(frac_value))
        .ok_or(UnitsError::Overflow)
}

/// [`format_units`] using the chain's decimals.
pub fn format_amount(chain: Chain, amount: u128) -> String {
    format_units(amount, chain.decimals())
}

/// [`parse_units`] using the chain's decimals.
pub fn parse_amount(chain: Chain, s: &str) -> Result<u128, UnitsError> {
    parse_units(s, chain.decimals())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn format_trims_trailing_zeros() {
        assert_eq!(format_units(150_000_000, 8), "1.5");
        assert_eq!(format_units(0, 8), "0");
        assert_eq!(format_units(1, 8), "0.00000001");
        assert_eq!(format_units(2_100_000_000_000_000, 8), "21000000");
    }

    #[test]
    fn format_wei() {
        assert_eq!(format_amount(Chain::Eth, 1_234_000_000_000_000_000), "1.234");
    }

    #[test]
    fn parse_accepts_common_forms() {
        assert_eq!(parse_units("1", 8).unwrap(), 100_000_000);
        assert_eq!(parse_units("0.001", 8).unwrap(), 100_000);
        assert_eq!(parse_units(".5", 8).unwrap(), 50_000_000);
        assert_eq!(parse_units("2.", 8).unwrap(), 200_000_000);
        assert_eq!(parse_amount(Chain::Ltc, " 0.0001 ").unwrap(), 10_000);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(parse_units("", 8).unwrap_err(), UnitsError::Empty);
        assert!(matches!(parse_units(".", 8), Err(UnitsError::Invalid(_))));
        assert!(matches!(parse_units("-1", 8), Err(UnitsError::Invalid(_))));
        assert!(matches!(parse_units("1e5", 8), Err(UnitsError::Invalid(_))));
        assert!(matches!(parse_units("1.2.3", 8), Err(UnitsError::Invalid(_))));
        assert_eq!(
            parse_units("0.000000001", 8).unwrap_err(),
            UnitsError::TooPrecise { max: 8 }
        );
        assert_eq!(
            parse_units(&"9".repeat(60), 18).unwrap_err(),
            UnitsError::Overflow
        );
    }

    proptest! {
        #[test]
        fn format_then_parse_is_identity(
            amount in 0u128..=u64::MAX as u128,
            decimals in 0u32..=18,
        ) {
            let s = format_units(amount, decimals);
            prop_assert_eq!(parse_units(&s, decimals).unwrap(), amount);
        }
    }
}
