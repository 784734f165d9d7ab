//! Fixed-point math utilities for deterministic simulation.
//!
//! Every distance the bot compares goes through fixed-point arithmetic so
//! two machines replaying the same orders make the same decisions.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// `sqrt(2) - 1`, the extra cost of a diagonal step in block distance.
pub const SQRT2_MINUS_ONE: Fixed = Fixed::from_bits(1_779_033_704);

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Round a fixed-point value to the nearest integer.
#[must_use]
pub fn round_to_i32(value: Fixed) -> i32 {
    value.round().to_num::<i32>()
}

/// Integer percentage test without division: `part < percent% of whole`.
#[must_use]
pub const fn below_percent(part: i32, whole: i32, percent: i32) -> bool {
    (part as i64) * 100 < (whole as i64) * (percent as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sqrt_perfect_squares() {
        for n in [1, 4, 9, 16, 100, 10_000] {
            let root = fixed_sqrt(Fixed::from_num(n));
            let expected = Fixed::from_num((n as f64).sqrt() as i32);
            assert!((root - expected).abs() < Fixed::from_num(0.001));
        }
    }

    #[test]
    fn test_fixed_sqrt_non_positive_is_zero() {
        assert_eq!(fixed_sqrt(Fixed::ZERO), Fixed::ZERO);
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
    }

    #[test]
    fn test_sqrt2_constant() {
        let sqrt2 = fixed_sqrt(Fixed::from_num(2));
        assert!((sqrt2 - Fixed::ONE - SQRT2_MINUS_ONE).abs() < Fixed::from_num(0.0001));
    }

    #[test]
    fn test_round_to_i32() {
        assert_eq!(round_to_i32(Fixed::from_num(2.4)), 2);
        assert_eq!(round_to_i32(Fixed::from_num(2.6)), 3);
    }

    #[test]
    fn test_below_percent() {
        assert!(below_percent(55, 100, 60));
        assert!(!below_percent(60, 100, 60));
        assert!(below_percent(440, 800, 60));
    }
}
