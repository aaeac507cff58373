//! Calendar arithmetic for period generation.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use super::error::FiscalError;

/// A period to be created, before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodPlan {
    /// `YYYY-MM`, or `YYYY-MM - YYYY-MM` when the slice spans months.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
}

/// Returns the last day of the month containing `date`.
#[must_use]
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Whole months between two dates, ignoring the day of month.
///
/// `2024-01-31 → 2024-04-01` is 3, `2024-01-01 → 2024-01-31` is 0.
#[must_use]
pub fn elapsed_months(start: NaiveDate, end: NaiveDate) -> i64 {
    i64::from(end.year() - start.year()) * 12 + i64::from(end.month()) - i64::from(start.month())
}

fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Slices `[start, end]` into consecutive ranges of `interval` calendar
/// months. Each range ends on the last day of its final month, except the
/// last one which is clamped to `end`. The ranges cover every day of
/// `[start, end]`, so a year ending on the first of a month gets a final
/// one-day period.
pub fn plan_periods(start: NaiveDate, end: NaiveDate, interval: u32) -> Result<Vec<PeriodPlan>, FiscalError> {
    if interval == 0 {
        return Err(FiscalError::InvalidInterval(interval));
    }
    if start > end {
        return Err(FiscalError::InvalidDateRange { start, end });
    }

    let mut plans = Vec::new();
    let mut period_start = start;
    while period_start <= end {
        let stretched = period_start
            .checked_add_months(Months::new(interval - 1))
            .unwrap_or(end);
        let period_end = last_day_of_month(stretched).min(end);

        let mut name = month_label(period_start);
        let end_label = month_label(period_end);
        if name != end_label {
            name = format!("{name} - {end_label}");
        }

        plans.push(PeriodPlan {
            name,
            start_date: period_start,
            end_date: period_end,
        });

        match period_end.succ_opt() {
            Some(next) => period_start = next,
            None => break,
        }
    }
    Ok(plans)
}
