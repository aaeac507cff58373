//! Target, difference and percentage computations.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::TargetError;
use super::types::TargetSpan;
use crate::fiscal::elapsed_months;

/// Pure target arithmetic.
pub struct TargetService;

impl TargetService {
    /// Months factor of a span.
    ///
    /// Whole months between the two ends, day of month ignored. A span
    /// missing either end has no factor (`None`).
    ///
    /// # Errors
    ///
    /// `InvalidSpan` when `to` is before `from`.
    pub fn months(span: TargetSpan) -> Result<Option<i64>, TargetError> {
        match (span.from, span.to) {
            (Some(from), Some(to)) if to < from => Err(TargetError::InvalidSpan { from, to }),
            (Some(from), Some(to)) => Ok(Some(elapsed_months(from, to))),
            _ => Ok(None),
        }
    }

    /// `unit × child_value × months`, months omitted when the span has no
    /// dates.
    ///
    /// # Errors
    ///
    /// `InvalidSpan` when the span is reversed.
    pub fn target(unit: Decimal, child_value: u64, span: TargetSpan) -> Result<Decimal, TargetError> {
        let mut target = unit * Decimal::from(child_value);
        if let Some(months) = Self::months(span)? {
            target *= Decimal::from(months);
        }
        Ok(target)
    }

    /// `target - actual`.
    #[must_use]
    pub fn difference(target: Decimal, actual: Decimal) -> Decimal {
        target - actual
    }

    /// `actual / target` rounded to two decimals, or zero when there is no
    /// target.
    #[must_use]
    pub fn percentage(actual: Decimal, target: Decimal) -> Decimal {
        if target.is_zero() {
            return Decimal::ZERO;
        }
        (actual / target).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_target_scales_by_months() {
        let span = TargetSpan::between(d(2024, 1, 1), d(2024, 4, 1));
        assert_eq!(TargetService::target(dec!(2), 6, span).unwrap(), dec!(36));
    }

    #[test]
    fn test_target_without_dates_has_no_months_factor() {
        assert_eq!(TargetService::target(dec!(2), 6, TargetSpan::unbounded()).unwrap(), dec!(12));
        let half_open = TargetSpan {
            from: Some(d(2024, 1, 1)),
            to: None,
        };
        assert_eq!(TargetService::target(dec!(2), 6, half_open).unwrap(), dec!(12));
    }

    #[test]
    fn test_same_month_span_is_zero() {
        let span = TargetSpan::between(d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(TargetService::target(dec!(2), 6, span).unwrap(), dec!(0));
    }

    #[test]
    fn test_reversed_span_fails() {
        let span = TargetSpan::between(d(2024, 5, 1), d(2024, 1, 1));
        assert_eq!(
            TargetService::target(dec!(1), 1, span).unwrap_err().error_code(),
            "INVALID_TARGET_SPAN"
        );
    }

    #[rstest]
    #[case(dec!(8), dec!(36), dec!(0.22))]
    #[case(dec!(36), dec!(36), dec!(1))]
    #[case(dec!(50), dec!(40), dec!(1.25))]
    #[case(dec!(1), dec!(8), dec!(0.12))]
    #[case(dec!(5), dec!(0), dec!(0))]
    #[case(dec!(0), dec!(0), dec!(0))]
    fn test_percentage(#[case] actual: Decimal, #[case] target: Decimal, #[case] expected: Decimal) {
        assert_eq!(TargetService::percentage(actual, target), expected);
    }

    #[test]
    fn test_difference_is_target_minus_actual() {
        assert_eq!(TargetService::difference(dec!(36), dec!(8)), dec!(28));
        assert_eq!(TargetService::difference(dec!(6), dec!(8)), dec!(-2));
    }
}
