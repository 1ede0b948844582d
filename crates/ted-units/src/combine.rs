/// Denominators that leave the numerator unchanged.
const DIMENSIONLESS: &[&str] = &["", "1", "dimensionless", "-"];

/// Renders `numerator/denominator` as a unit string.
///
/// A compound denominator is parenthesized. A dimensionless denominator
/// yields the bare numerator.
pub fn combine_units(numerator: &str, denominator: &str) -> String {
    let numerator = numerator.trim();
    let denominator = denominator.trim();
    if DIMENSIONLESS.contains(&denominator) {
        return numerator.to_string();
    }
    if denominator.contains('/') {
        format!("{numerator}/({denominator})")
    } else {
        format!("{numerator}/{denominator}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fraction() {
        assert_eq!(combine_units("EUR_2024", "kW"), "EUR_2024/kW");
    }

    #[test]
    fn parenthesizes_compound_denominator() {
        assert_eq!(combine_units("EUR_2024", "t/a"), "EUR_2024/(t/a)");
    }

    #[test]
    fn dimensionless_denominator_is_dropped() {
        assert_eq!(combine_units("MWh", "dimensionless"), "MWh");
        assert_eq!(combine_units("MWh", ""), "MWh");
        assert_eq!(combine_units("MWh", "1"), "MWh");
    }
}
