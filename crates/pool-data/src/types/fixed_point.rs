//! Conversion of on-chain fixed-point integers to off-chain `Decimal`.
//!
//! `U256` balances routinely exceed what `Decimal` can hold before they are
//! scaled, so the scale-down happens in integer space first (quotient and
//! remainder by `10^decimals`) and only the result crosses into `Decimal`.
//! Nothing here goes through `f64`, and nothing falls back to zero.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use thiserror::Error;

/// Largest mantissa `Decimal` can represent (2^96 - 1).
const DECIMAL_MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// Maximum number of fractional digits `Decimal` carries.
const DECIMAL_MAX_SCALE: u32 = 28;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixedPointError {
    #[error("scale 10^{0} does not fit in 256 bits")]
    ScaleTooLarge(u32),

    #[error("{value} scaled by 10^{decimals} exceeds the decimal range")]
    Overflow { value: U256, decimals: u32 },
}

/// `10^exp` as a `U256`.
pub fn pow10(exp: u32) -> Result<U256, FixedPointError> {
    U256::from(10u64)
        .checked_pow(U256::from(exp))
        .ok_or(FixedPointError::ScaleTooLarge(exp))
}

/// Convert `raw / 10^decimals` to `Decimal`.
///
/// The integer part must fit the 96-bit mantissa. Fractional digits beyond
/// the 28 that `Decimal` carries are truncated.
pub fn fixed_to_decimal(raw: U256, decimals: u32) -> Result<Decimal, FixedPointError> {
    let overflow = || FixedPointError::Overflow {
        value: raw,
        decimals,
    };

    let scale = pow10(decimals)?;
    let whole = raw / scale;
    let frac = raw % scale;

    let whole = u128::try_from(whole)
        .ok()
        .filter(|w| *w <= DECIMAL_MAX_MANTISSA)
        .ok_or_else(overflow)?;
    let mut value = Decimal::from_i128_with_scale(whole as i128, 0);

    if !frac.is_zero() {
        let (frac, frac_scale) = if decimals > DECIMAL_MAX_SCALE {
            (frac / pow10(decimals - DECIMAL_MAX_SCALE)?, DECIMAL_MAX_SCALE)
        } else {
            (frac, decimals)
        };
        // frac < 10^28 < 2^96 at this point.
        let frac = u128::try_from(frac).map_err(|_| overflow())?;
        value = value
            .checked_add(Decimal::from_i128_with_scale(frac as i128, frac_scale))
            .ok_or_else(overflow)?;
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_six_decimals() {
        let raw = U256::from(1_000_000u64);
        assert_eq!(fixed_to_decimal(raw, 6).unwrap(), dec!(1));
    }

    #[test]
    fn test_zero_decimals_is_identity() {
        let raw = U256::from(12_345u64);
        assert_eq!(fixed_to_decimal(raw, 0).unwrap(), dec!(12345));
    }

    #[test]
    fn test_wad_fraction() {
        // 2.5e18 at 18 decimals = 2.5
        let raw = U256::from(2_500_000_000_000_000_000u128);
        assert_eq!(fixed_to_decimal(raw, 18).unwrap(), dec!(2.5));
    }

    #[test]
    fn test_zero_value() {
        assert_eq!(fixed_to_decimal(U256::ZERO, 18).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_value_larger_than_decimal_before_scaling() {
        // 1e40 raw at 18 decimals = 1e22, which fits once scaled.
        let raw = pow10(40).unwrap();
        assert_eq!(
            fixed_to_decimal(raw, 18).unwrap(),
            dec!(10_000_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_precision_kept_for_large_balances() {
        // 27 significant digits: exact in Decimal, lossy through f64.
        let raw: U256 = "123456789012345678901234567".parse().unwrap();
        assert_eq!(
            fixed_to_decimal(raw, 18).unwrap(),
            dec!(123456789.012345678901234567)
        );
    }

    #[test]
    fn test_price_scale_36() {
        // 5e26 at 36 decimals = 0.0000000005
        let raw = U256::from(500_000_000_000_000_000_000_000_000u128);
        assert_eq!(fixed_to_decimal(raw, 36).unwrap(), dec!(0.0000000005));
    }

    #[test]
    fn test_more_than_28_fraction_digits_truncates() {
        // 1 unit at 30 decimals is below Decimal's resolution.
        assert_eq!(fixed_to_decimal(U256::from(1u64), 30).unwrap(), Decimal::ZERO);
        // 1e30 + 1 at 30 decimals keeps the whole part.
        let raw = pow10(30).unwrap() + U256::from(1u64);
        assert_eq!(fixed_to_decimal(raw, 30).unwrap(), dec!(1));
    }

    #[test]
    fn test_whole_part_overflow_is_error() {
        let err = fixed_to_decimal(U256::MAX, 0).unwrap_err();
        assert!(matches!(err, FixedPointError::Overflow { decimals: 0, .. }));
    }

    #[test]
    fn test_scale_too_large() {
        assert_eq!(pow10(78).unwrap_err(), FixedPointError::ScaleTooLarge(78));
        assert!(pow10(77).is_ok());
        assert!(fixed_to_decimal(U256::from(1u64), 200).is_err());
    }
}
