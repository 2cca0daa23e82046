//! FILENAME: core/pivot-engine/tests/properties.rs
//! Property tests for field filters and cross-tab derivation.

use fact_model::{FactTable, FactValue};
use pivot_engine::{derive_cross_tab, domain_of, FieldFilterState, PivotArrangement};
use proptest::prelude::*;

const FIELDS: [&str; 3] = ["User", "Month", "Minutes"];

fn user_candidates() -> Vec<FactValue> {
    vec![
        FactValue::text("Ana"),
        FactValue::text("Beto"),
        FactValue::text("Carla"),
        FactValue::Empty,
    ]
}

fn month_candidates() -> Vec<FactValue> {
    (1..=4).map(|m| FactValue::Number(m as f64)).collect()
}

// -- Strategy helpers --

fn arb_user() -> impl Strategy<Value = FactValue> {
    prop::sample::select(user_candidates())
}

fn arb_month() -> impl Strategy<Value = FactValue> {
    prop_oneof![
        4 => prop::sample::select(month_candidates()),
        1 => Just(FactValue::Empty),
    ]
}

fn arb_minutes() -> impl Strategy<Value = FactValue> {
    // Whole numbers keep sums exact
    prop_oneof![
        6 => (-120i64..480).prop_map(|m| FactValue::Number(m as f64)),
        1 => Just(FactValue::Empty),
    ]
}

fn arb_table() -> impl Strategy<Value = FactTable> {
    prop::collection::vec((arb_user(), arb_month(), arb_minutes()), 0..60).prop_map(|rows| {
        let rows = rows.into_iter().map(|(u, m, v)| vec![u, m, v]).collect();
        FactTable::from_values(&FIELDS, rows).unwrap()
    })
}

/// Optional selection mask per dimension field.
fn arb_masks() -> impl Strategy<Value = (Option<Vec<bool>>, Option<Vec<bool>>)> {
    (
        prop::option::of(prop::collection::vec(any::<bool>(), 4)),
        prop::option::of(prop::collection::vec(any::<bool>(), 4)),
    )
}

fn arb_arrangement() -> impl Strategy<Value = PivotArrangement> {
    prop_oneof![
        Just(PivotArrangement::new("Minutes")),
        Just(PivotArrangement::new("Minutes").with_rows(["User"])),
        Just(PivotArrangement::new("Minutes").with_cols(["Month"])),
        Just(PivotArrangement::new("Minutes").with_rows(["User"]).with_cols(["Month"])),
        Just(PivotArrangement::new("Minutes").with_rows(["Month", "User"])),
        Just(PivotArrangement::new("Minutes").with_cols(["User", "Month"])),
    ]
}

fn pick(candidates: Vec<FactValue>, mask: &[bool]) -> Vec<FactValue> {
    candidates
        .into_iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(v, _)| v)
        .collect()
}

fn build_filters(table: &FactTable, masks: &(Option<Vec<bool>>, Option<Vec<bool>>)) -> FieldFilterState {
    let mut filters = FieldFilterState::new();
    if let Some(mask) = &masks.0 {
        filters.set_filter(table, "User", pick(user_candidates(), mask)).unwrap();
    }
    if let Some(mask) = &masks.1 {
        filters.set_filter(table, "Month", pick(month_candidates(), mask)).unwrap();
    }
    filters
}

/// Widens every mask: a value allowed before stays allowed.
fn widen(masks: &(Option<Vec<bool>>, Option<Vec<bool>>), extra: &[bool]) -> (Option<Vec<bool>>, Option<Vec<bool>>) {
    let or = |mask: &Option<Vec<bool>>| {
        mask.as_ref()
            .map(|m| m.iter().zip(extra).map(|(a, b)| *a || *b).collect::<Vec<bool>>())
    };
    (or(&masks.0), or(&masks.1))
}

proptest! {
    #[test]
    fn test_filter_is_idempotent(table in arb_table(), masks in arb_masks()) {
        let filters = build_filters(&table, &masks);
        let once = filters.apply(&table).unwrap();
        let twice = filters.apply(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_is_monotonic(
        table in arb_table(),
        masks in arb_masks(),
        extra in prop::collection::vec(any::<bool>(), 4),
    ) {
        let narrow = build_filters(&table, &masks);
        let wide = build_filters(&table, &widen(&masks, &extra));

        let narrow_rows = narrow.apply(&table).unwrap();
        let wide_rows = wide.apply(&table).unwrap();
        prop_assert!(wide_rows.len() >= narrow_rows.len());
        // Every row the narrow filter keeps, the wide one keeps too
        prop_assert_eq!(narrow.apply(&wide_rows).unwrap(), narrow_rows);
    }

    #[test]
    fn test_domain_ignores_filters(table in arb_table(), masks in arb_masks()) {
        let before_user = domain_of(&table, "User").unwrap();
        let before_month = domain_of(&table, "Month").unwrap();

        let filters = build_filters(&table, &masks);
        prop_assert_eq!(&domain_of(&table, "User").unwrap(), &before_user);
        prop_assert_eq!(&domain_of(&table, "Month").unwrap(), &before_month);

        // Stored allow-lists are strict subsets of the unfiltered domain
        for (field, domain) in [("User", &before_user), ("Month", &before_month)] {
            if let Some(allowed) = filters.allowed(field) {
                prop_assert!(allowed.len() < domain.len());
                prop_assert!(allowed.iter().all(|v| domain.contains(v)));
            }
        }
    }

    #[test]
    fn test_cross_tab_sum_matches_facts(
        table in arb_table(),
        masks in arb_masks(),
        arrangement in arb_arrangement(),
    ) {
        let filtered = build_filters(&table, &masks).apply(&table).unwrap();
        let tab = derive_cross_tab(&filtered, &arrangement).unwrap();
        let expected = filtered.sum("Minutes").unwrap();

        prop_assert_eq!(tab.cell_sum(), expected);
        prop_assert_eq!(tab.grand_total(), expected);
    }
}
