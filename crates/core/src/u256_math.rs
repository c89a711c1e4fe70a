//! U256 fixed-point helpers for oracle prices.
//!
//! Oracle prices arrive as raw `uint256` values. Ratios are kept in 18-decimal
//! fixed point so comparisons against tier boundaries are exact; conversions
//! to f64 are for statistics and display.

use alloy::primitives::U256;

/// WAD constant: 1e18 for 18-decimal fixed-point arithmetic
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// Divide two values into a WAD ratio: (a * WAD) / b
///
/// Returns None when `b` is zero or the product overflows.
#[inline(always)]
pub fn wad_div(a: U256, b: U256) -> Option<U256> {
    if b.is_zero() {
        return None;
    }
    a.checked_mul(WAD).map(|scaled| scaled / b)
}

/// Convert a decimal fraction to WAD, rounding to the nearest unit.
#[inline(always)]
pub fn f64_to_wad(value: f64) -> U256 {
    if value <= 0.0 {
        return U256::ZERO;
    }
    U256::from((value * 1e18).round() as u128)
}

/// Convert WAD (18 decimals) to f64.
#[inline(always)]
pub fn wad_to_f64(wad: U256) -> f64 {
    u256_to_f64(wad) / 1e18
}

/// Convert an integer U256 to the nearest f64.
#[inline(always)]
pub fn u256_to_f64(value: U256) -> f64 {
    if value <= U256::from(u128::MAX) {
        let v: u128 = value.to();
        v as f64
    } else {
        value
            .as_limbs()
            .iter()
            .rev()
            .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wad_div_exact() {
        let a = wad_div(U256::from(9u64), U256::from(10u64)).unwrap();
        let b = wad_div(U256::from(8u64), U256::from(10u64)).unwrap();
        assert_eq!(a - b, f64_to_wad(0.1));
    }

    #[test]
    fn test_wad_div_by_zero() {
        assert!(wad_div(U256::from(1u64), U256::ZERO).is_none());
    }

    #[test]
    fn test_f64_to_wad() {
        assert_eq!(f64_to_wad(0.02), U256::from(20_000_000_000_000_000u64));
        assert_eq!(f64_to_wad(0.1), U256::from(100_000_000_000_000_000u64));
        assert_eq!(f64_to_wad(-1.0), U256::ZERO);
    }

    #[test]
    fn test_wad_to_f64() {
        let wad = U256::from(1000u64) * WAD;
        assert!((wad_to_f64(wad) - 1000.0).abs() < 0.001);
    }

    #[test]
    fn test_u256_to_f64_large() {
        let value = U256::from(u128::MAX) + U256::from(1u64);
        let expected = 2f64.powi(128);
        assert_eq!(u256_to_f64(value), expected);
        assert_eq!(u256_to_f64(U256::from(218474666888275u64)), 218474666888275.0);
    }
}
