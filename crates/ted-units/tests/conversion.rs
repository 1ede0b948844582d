//! Conversion properties over arbitrary unit strings.

use proptest::prelude::*;
use ted_units::{UnitCache, UnitConverter, UnitPair, combine_units};

fn converter() -> UnitConverter {
    UnitConverter::from_cache(
        UnitCache::new()
            .with("MWh", "GJ", None, 3.6)
            .with("EUR_2020", "EUR_2024", None, 1.18),
    )
}

proptest! {
    #[test]
    fn same_unit_converts_to_one(unit in "[A-Za-z_/0-9]{1,12}", ft in proptest::option::of("[a-z0-9]{1,6}")) {
        let factor = converter().convert(Some(&unit), Some(&unit), ft.as_deref()).unwrap();
        prop_assert_eq!(factor, 1.0);
    }

    #[test]
    fn unset_unit_is_nan(unit in "[A-Za-z_/0-9]{1,12}") {
        let conv = converter();
        prop_assert!(conv.convert(None, Some(&unit), None).unwrap().is_nan());
        prop_assert!(conv.convert(Some(&unit), None, None).unwrap().is_nan());
        prop_assert!(conv.convert(None, None, None).unwrap().is_nan());
    }

    #[test]
    fn plain_denominator_is_not_parenthesized(num in "[A-Za-z_]{1,8}", den in "[A-Za-z]{2,8}") {
        prop_assert_eq!(combine_units(&num, &den), format!("{num}/{den}"));
    }
}

// ============================================================================
// Row-wise conversion
// ============================================================================

#[test]
fn row_wise_conversion_matches_single_lookups() {
    let conv = converter();
    let pairs = vec![
        UnitPair::new(Some("EUR_2020"), Some("EUR_2024"), None),
        UnitPair::new(Some("MWh"), Some("GJ"), Some("elec")),
        UnitPair::new(None, Some("GJ"), None),
    ];
    let factors = conv.convert_rows(&pairs);
    assert_eq!(factors.len(), 3);
    assert_eq!(factors[0], 1.18);
    assert_eq!(factors[1], 3.6);
    assert!(factors[2].is_nan());
}
