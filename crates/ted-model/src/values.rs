//! Cell parsing and formatting helpers.
//!
//! Empty cells are missing values. Numbers are written without a trailing
//! `.0` so periods round-trip as `2030`, not `2030.0`.

/// Parses a cell as f64, returning None for empty cells.
///
/// Returns `Err(())` when the cell is non-empty but not a number.
pub fn parse_optional_f64(value: &str) -> Result<Option<f64>, ()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.eq_ignore_ascii_case("nan") {
        return Ok(Some(f64::NAN));
    }
    trimmed.parse::<f64>().map(Some).map_err(|_| ())
}

/// Formats a number for CSV output. NaN becomes an empty cell.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// Formats an optional number, with None as an empty cell.
pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

/// Rounds to the given number of decimal digits, keeping NaN.
pub fn round_to(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

/// Converts an empty or whitespace-only cell to None.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_integers_without_fraction() {
        assert_eq!(format_number(2030.0), "2030");
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(f64::NAN), "");
    }

    #[test]
    fn parses_optional_numbers() {
        assert_eq!(parse_optional_f64(""), Ok(None));
        assert_eq!(parse_optional_f64(" 2.5 "), Ok(Some(2.5)));
        assert!(parse_optional_f64("n/a").is_err());
    }

    #[test]
    fn rounds_to_four_digits() {
        assert_eq!(round_to(1.234_56, 4), 1.2346);
        assert!(round_to(f64::NAN, 4).is_nan());
    }
}
