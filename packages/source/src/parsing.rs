//! Shared numeric parsing for tabular sources.

/// Parses a decimal number written with a comma separator (`"0,726"`).
/// A dot separator is accepted as well. Returns `None` for blank,
/// malformed or non-finite values.
#[must_use]
pub fn parse_decimal_comma(s: &str) -> Option<f64> {
    let normalized = s.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a non-negative whole count. Spreadsheet exports sometimes
/// write counts as `"12.0"`, which is accepted; fractional or negative
/// values are not.
#[must_use]
pub fn parse_count(s: &str) -> Option<u64> {
    let trimmed = s.trim();
    if let Ok(count) = trimmed.parse::<u64>() {
        return Some(count);
    }
    let value = parse_decimal_comma(trimmed)?;
    if value < 0.0 || value.fract() != 0.0 || value > 9_007_199_254_740_992.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_decimals() {
        let v = parse_decimal_comma("0,726").unwrap();
        assert!((v - 0.726).abs() < f64::EPSILON);
        let v = parse_decimal_comma(" 0.5 ").unwrap();
        assert!((v - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_malformed_decimals() {
        assert!(parse_decimal_comma("").is_none());
        assert!(parse_decimal_comma("n/d").is_none());
        assert!(parse_decimal_comma("1.234,5").is_none());
        assert!(parse_decimal_comma("NaN").is_none());
    }

    #[test]
    fn parses_whole_counts() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("2.5"), None);
        assert_eq!(parse_count(""), None);
    }
}
