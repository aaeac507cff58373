//! Property-based tests for the fiscal calendar.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use tmi_shared::types::{CompanyId, PeriodId, YearId};

use super::calendar::plan_periods;
use super::period::{Period, PeriodState, PeriodType, Year, YearState, ranges_overlap};
use super::service::FiscalService;

/// Strategy for a year start between 2000 and 2040.
fn arb_start() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2040, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn year_of(start: NaiveDate, length_days: u64) -> Year {
    Year {
        id: YearId::generate(),
        company_id: CompanyId::from(uuid::Uuid::nil()),
        name: start.format("%Y").to_string(),
        start_date: start,
        end_date: start.checked_add_days(Days::new(length_days)).unwrap(),
        state: YearState::Open,
    }
}

fn materialize(year: &Year, interval: u32) -> Vec<Period> {
    plan_periods(year.start_date, year.end_date, interval)
        .unwrap()
        .into_iter()
        .map(|plan| Period {
            id: PeriodId::generate(),
            year_id: year.id,
            name: plan.name,
            start_date: plan.start_date,
            end_date: plan.end_date,
            state: PeriodState::Open,
            period_type: PeriodType::Standard,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Generated periods tile the year: contiguous, inside it, never overlapping
    // =========================================================================

    #[test]
    fn prop_generated_periods_are_contiguous(start in arb_start(), length in 30u64..800, interval in 1u32..=12) {
        let year = year_of(start, length);
        let periods = materialize(&year, interval);

        prop_assert!(!periods.is_empty());
        prop_assert_eq!(periods[0].start_date, year.start_date);
        prop_assert_eq!(periods.last().unwrap().end_date, year.end_date);
        for pair in periods.windows(2) {
            prop_assert_eq!(pair[0].end_date.succ_opt().unwrap(), pair[1].start_date);
        }
        for p in &periods {
            prop_assert!(p.start_date <= p.end_date);
            prop_assert!(FiscalService::validate_period(p, &year, &periods).is_ok());
        }
    }

    // =========================================================================
    // Any standard period intersecting an existing one is rejected
    // =========================================================================

    #[test]
    fn prop_overlapping_period_rejected(start in arb_start(), pick in 0usize..12, shift in 0u64..20, span in 0u64..40) {
        let year = year_of(start, 364);
        let periods = materialize(&year, 1);
        let anchor = &periods[pick % periods.len()];
        let candidate_start = anchor.start_date.checked_add_days(Days::new(shift)).unwrap().min(anchor.end_date);
        let candidate_end = candidate_start.checked_add_days(Days::new(span)).unwrap().min(year.end_date);

        let candidate = Period {
            id: PeriodId::generate(),
            year_id: year.id,
            name: "candidate".into(),
            start_date: candidate_start,
            end_date: candidate_end,
            state: PeriodState::Open,
            period_type: PeriodType::Standard,
        };

        let collides = periods.iter().any(|p| ranges_overlap(p.start_date, p.end_date, candidate_start, candidate_end));
        prop_assert!(collides);
        prop_assert!(FiscalService::validate_period(&candidate, &year, &periods).is_err());
    }

    // =========================================================================
    // A window always covers exactly the periods between its boundaries
    // =========================================================================

    #[test]
    fn prop_window_matches_index_range(start in arb_start(), a in 0usize..12, b in 0usize..12) {
        let year = year_of(start, 364);
        let periods = materialize(&year, 1);
        let (lo, hi) = (a.min(b) % periods.len(), a.max(b) % periods.len());
        let (lo, hi) = (lo.min(hi), lo.max(hi));

        let window = FiscalService::period_window(&periods, Some(&periods[lo]), Some(&periods[hi]));
        prop_assert_eq!(window.len(), hi - lo + 1);
        for p in &periods[lo..=hi] {
            prop_assert!(window.contains(&p.id));
        }
    }
}
