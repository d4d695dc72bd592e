//! Numeric conversion helpers centralizing safe numeric casts and the
//! float-noise tolerance used by duration display.

use num_traits::cast::cast;

/// Distance from an integer below which a day value is treated as that
/// integer. Repeated fractional-day addition leaves values like
/// `14.999999999999998` in otherwise whole-day chains.
const FLOAT_NOISE: f64 = 1e-9;

/// Snap a value to the nearest integer when it sits within float noise of
/// one, returning 0.0 for NaN values.
#[must_use]
pub fn clean_float_noise(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    let rounded = value.round();
    if (value - rounded).abs() < FLOAT_NOISE {
        rounded
    } else {
        value
    }
}

/// Floor a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).floor();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Truncate a f64 toward zero and clamp it to the i64 range, returning 0 for
/// non-finite values.
#[must_use]
pub fn trunc_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).trunc();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Parse the leading optionally-signed integer of a string, ignoring any
/// trailing text. Save fields authored by hand show up as `"42"` or even
/// `"42 years"`; strings with no leading integer parse as `None`.
#[must_use]
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();
    let digits_start = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut end = digits_start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_snaps_to_integers() {
        assert!((clean_float_noise(14.999_999_999_999_998) - 15.0).abs() < f64::EPSILON);
        assert!((clean_float_noise(14.5) - 14.5).abs() < f64::EPSILON);
        assert!((clean_float_noise(f64::NAN) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn floor_clamps_and_handles_non_finite() {
        assert_eq!(floor_f64_to_i64(1.7), 1);
        assert_eq!(floor_f64_to_i64(-1.2), -2);
        assert_eq!(floor_f64_to_i64(f64::NAN), 0);
        assert_eq!(floor_f64_to_i64(f64::INFINITY), 0);
    }

    #[test]
    fn trunc_rounds_toward_zero() {
        assert_eq!(trunc_f64_to_i64(4.9), 4);
        assert_eq!(trunc_f64_to_i64(-4.9), -4);
        assert_eq!(trunc_f64_to_i64(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn int_prefix_tolerates_trailing_text() {
        assert_eq!(parse_int_prefix("42"), Some(42));
        assert_eq!(parse_int_prefix(" 42 years "), Some(42));
        assert_eq!(parse_int_prefix("-3"), Some(-3));
        assert_eq!(parse_int_prefix("+7x"), Some(7));
        assert_eq!(parse_int_prefix("4.9"), Some(4));
        assert_eq!(parse_int_prefix("years 4"), None);
        assert_eq!(parse_int_prefix(""), None);
    }
}
