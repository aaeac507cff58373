//! Property-based tests for target arithmetic.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::TargetService;
use super::types::{TargetConfiguration, TargetSpan, DEFAULT_TARGET};
use crate::ledger::Metric;

fn unit() -> impl Strategy<Value = Decimal> {
    (0i64..10_000i64).prop_map(|v| Decimal::new(v, 2))
}

fn actual() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|v| Decimal::new(v, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A zero target never divides: the percentage is zero.
    #[test]
    fn prop_zero_target_percentage_is_zero(actual in actual()) {
        prop_assert_eq!(TargetService::percentage(actual, Decimal::ZERO), Decimal::ZERO);
    }

    /// Percentages always carry at most two decimals.
    #[test]
    fn prop_percentage_has_two_decimals(actual in actual(), target in 1i64..1_000_000i64) {
        let pct = TargetService::percentage(actual, Decimal::new(target, 2));
        prop_assert!(pct.scale() <= 2);
    }

    /// The target is linear in the small group count and in the months.
    #[test]
    fn prop_target_is_linear(
        unit in unit(),
        child_value in 0u64..500,
        start_month in 1u32..=12,
        months in 0u32..36,
    ) {
        let from = NaiveDate::from_ymd_opt(2024, start_month, 1).unwrap();
        let to = from.checked_add_months(chrono::Months::new(months)).unwrap();
        let scaled = TargetService::target(unit, child_value, TargetSpan::between(from, to)).unwrap();
        let flat = TargetService::target(unit, child_value, TargetSpan::unbounded()).unwrap();
        prop_assert_eq!(flat, unit * Decimal::from(child_value));
        prop_assert_eq!(scaled, flat * Decimal::from(months));
    }

    /// Overrides win; everything else falls back to the default unit.
    #[test]
    fn prop_unit_override_chain(value in unit(), index in 0usize..8) {
        let metric = Metric::ALL[index];
        let mut config = TargetConfiguration::default();
        config.set_unit(metric, value).unwrap();
        for other in Metric::ALL {
            let expected = if other == metric { value } else { DEFAULT_TARGET };
            prop_assert_eq!(config.unit(other), expected);
        }
    }
}
