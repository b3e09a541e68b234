//! Numeric conversion helpers centralizing the lossy casts used by the economy.

use num_traits::cast::cast;

/// Ceil a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn ceil_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    cast::<f64, i64>(value.ceil().clamp(min, max)).unwrap_or(0)
}

/// Widen an integer penalty into threat units.
#[must_use]
pub fn i64_to_threat(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Clamp a probability into `[0, 1]`, mapping NaN to zero.
#[must_use]
pub fn probability(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Convert a duration in milliseconds to a u64 count without panicking.
#[must_use]
pub fn millis_u64(millis: u128) -> u64 {
    u64::try_from(millis).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_rounds_up_and_handles_nan() {
        assert_eq!(ceil_to_i64(5.5), 6);
        assert_eq!(ceil_to_i64(4.0), 4);
        assert_eq!(ceil_to_i64(f64::NAN), 0);
        assert_eq!(ceil_to_i64(f64::INFINITY), 0);
    }

    #[test]
    fn probability_is_clamped() {
        assert!((probability(1.7) - 1.0).abs() < f64::EPSILON);
        assert!(probability(-0.2).abs() < f64::EPSILON);
        assert!(probability(f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn widening_is_exact_for_small_values() {
        assert!((i64_to_threat(12) - 12.0).abs() < f64::EPSILON);
        assert_eq!(millis_u64(u128::MAX), u64::MAX);
    }
}
