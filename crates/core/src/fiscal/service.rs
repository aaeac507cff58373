//! Year and period rules.
//!
//! Every function here is a pure check or lookup over records the caller has
//! already loaded. The repository runs them inside the transaction that holds
//! the period table lock, so the data cannot change underneath.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tmi_shared::types::PeriodId;

use super::calendar::{PeriodPlan, plan_periods};
use super::error::FiscalError;
use super::period::{Period, PeriodState, PeriodType, Year, YearState, ranges_overlap};

/// Which side of a period window a boundary period marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Periods strictly before the start boundary (subtracted).
    Start,
    /// Periods up to and including the end boundary.
    End,
}

/// Fields of a period that callers may change after creation.
#[derive(Debug, Clone, Default)]
pub struct PeriodChanges {
    /// New first day.
    pub start_date: Option<NaiveDate>,
    /// New last day.
    pub end_date: Option<NaiveDate>,
    /// New name.
    pub name: Option<String>,
}

impl PeriodChanges {
    /// Returns true if the changes touch the dates.
    #[must_use]
    pub fn touches_dates(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

/// Stateless service holding the fiscal calendar rules.
pub struct FiscalService;

impl FiscalService {
    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Returns the year containing `date`, preferring the most recent start.
    #[must_use]
    pub fn find_year(years: &[Year], date: NaiveDate) -> Option<&Year> {
        years
            .iter()
            .filter(|y| y.contains_date(date))
            .max_by_key(|y| y.start_date)
    }

    /// Like [`Self::find_year`] but fails when nothing matches.
    pub fn require_year(years: &[Year], date: NaiveDate) -> Result<&Year, FiscalError> {
        Self::find_year(years, date).ok_or(FiscalError::NoYearForDate(date))
    }

    /// Returns the standard period containing `date`.
    ///
    /// With `test_state` only open periods are considered.
    #[must_use]
    pub fn find_period(periods: &[Period], date: NaiveDate, test_state: bool) -> Option<&Period> {
        periods
            .iter()
            .filter(|p| p.is_standard() && p.contains_date(date))
            .filter(|p| !test_state || p.is_open())
            .max_by_key(|p| p.start_date)
    }

    /// Like [`Self::find_period`] but fails when nothing matches.
    pub fn require_period(periods: &[Period], date: NaiveDate, test_state: bool) -> Result<&Period, FiscalError> {
        Self::find_period(periods, date, test_state).ok_or(FiscalError::NoPeriodForDate(date))
    }

    // ------------------------------------------------------------------
    // Years
    // ------------------------------------------------------------------

    /// Validates a new or edited year against the other years of its company.
    pub fn validate_year(year: &Year, others: &[Year]) -> Result<(), FiscalError> {
        if year.start_date > year.end_date {
            return Err(FiscalError::InvalidDateRange {
                start: year.start_date,
                end: year.end_date,
            });
        }
        if let Some(other) = others.iter().find(|o| {
            o.id != year.id
                && o.company_id == year.company_id
                && ranges_overlap(year.start_date, year.end_date, o.start_date, o.end_date)
        }) {
            return Err(FiscalError::YearOverlaps {
                year: year.name.clone(),
                other: other.name.clone(),
            });
        }
        Ok(())
    }

    /// Checks that `year` may be closed: it must be open and every earlier
    /// year of the company must already be closed.
    pub fn validate_close_year(year: &Year, all_years: &[Year]) -> Result<(), FiscalError> {
        if year.state != YearState::Open {
            return Err(FiscalError::InvalidYearTransition {
                year: year.name.clone(),
                state: year.state.to_string(),
            });
        }
        if let Some(earlier) = all_years.iter().find(|o| {
            o.id != year.id
                && o.company_id == year.company_id
                && o.end_date <= year.start_date
                && o.is_open()
        }) {
            return Err(FiscalError::EarlierYearOpen {
                year: year.name.clone(),
                earlier: earlier.name.clone(),
            });
        }
        Ok(())
    }

    /// Returns the periods a year close has to move to `close`.
    #[must_use]
    pub fn periods_to_close(periods: &[Period]) -> Vec<PeriodId> {
        periods
            .iter()
            .filter(|p| p.state.can_transition_to(PeriodState::Close))
            .map(|p| p.id)
            .collect()
    }

    /// Checks that `year` may be reopened: it must be closed and no later
    /// year of the company may be closed.
    pub fn validate_reopen_year(year: &Year, all_years: &[Year]) -> Result<(), FiscalError> {
        if year.state != YearState::Close {
            return Err(FiscalError::InvalidYearTransition {
                year: year.name.clone(),
                state: year.state.to_string(),
            });
        }
        if let Some(later) = all_years.iter().find(|o| {
            o.id != year.id
                && o.company_id == year.company_id
                && o.start_date >= year.end_date
                && !o.is_open()
        }) {
            return Err(FiscalError::LaterYearClosed {
                year: year.name.clone(),
                later: later.name.clone(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Periods
    // ------------------------------------------------------------------

    /// Plans the standard periods of `year` in slices of `interval` months.
    pub fn plan_periods(year: &Year, interval: u32) -> Result<Vec<PeriodPlan>, FiscalError> {
        if !year.is_open() {
            return Err(FiscalError::CreatePeriodInClosedYear {
                period: format!("{interval}-month periods"),
                year: year.name.clone(),
            });
        }
        plan_periods(year.start_date, year.end_date, interval)
    }

    /// Validates a period against its year and its siblings.
    ///
    /// `siblings` may contain the period itself; it is skipped by id.
    pub fn validate_period(period: &Period, year: &Year, siblings: &[Period]) -> Result<(), FiscalError> {
        if period.start_date > period.end_date {
            return Err(FiscalError::InvalidDateRange {
                start: period.start_date,
                end: period.end_date,
            });
        }
        if period.start_date < year.start_date || period.end_date > year.end_date {
            return Err(FiscalError::PeriodOutsideYear {
                period: period.name.clone(),
                year: year.name.clone(),
            });
        }
        if period.period_type != PeriodType::Standard {
            return Ok(());
        }
        if let Some(other) = siblings.iter().find(|o| {
            o.id != period.id
                && o.year_id == period.year_id
                && o.is_standard()
                && ranges_overlap(period.start_date, period.end_date, o.start_date, o.end_date)
        }) {
            return Err(FiscalError::PeriodOverlaps {
                period: period.name.clone(),
                other: other.name.clone(),
            });
        }
        Ok(())
    }

    /// Validates the creation of `period` under `year`.
    pub fn validate_new_period(period: &Period, year: &Year, siblings: &[Period]) -> Result<(), FiscalError> {
        if !year.is_open() {
            return Err(FiscalError::CreatePeriodInClosedYear {
                period: period.name.clone(),
                year: year.name.clone(),
            });
        }
        Self::validate_period(period, year, siblings)
    }

    /// Validates a period state change.
    pub fn validate_period_transition(period: &Period, year: &Year, to: PeriodState) -> Result<(), FiscalError> {
        if !period.state.can_transition_to(to) {
            return Err(FiscalError::InvalidPeriodTransition {
                from: period.state.to_string(),
                to: to.to_string(),
            });
        }
        if to == PeriodState::Open && !year.is_open() {
            return Err(FiscalError::OpenPeriodInClosedYear {
                period: period.name.clone(),
                year: year.name.clone(),
            });
        }
        Ok(())
    }

    /// Rejects date changes on a period that already has moves.
    pub fn validate_period_edit(period: &Period, changes: &PeriodChanges, has_moves: bool) -> Result<(), FiscalError> {
        let moves_dates = changes.start_date.is_some_and(|d| d != period.start_date)
            || changes.end_date.is_some_and(|d| d != period.end_date);
        if has_moves && moves_dates {
            return Err(FiscalError::ModifyPeriodWithMoves(period.name.clone()));
        }
        Ok(())
    }

    /// Rejects deleting a period that has moves.
    pub fn validate_period_delete(period: &Period, has_moves: bool) -> Result<(), FiscalError> {
        if has_moves {
            return Err(FiscalError::DeletePeriodWithMoves(period.name.clone()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------

    /// Resolves the period ids ending at or before a boundary period.
    ///
    /// `year_periods` are all periods of the active year. For
    /// [`Boundary::End`] without an explicit period the latest standard
    /// period of the year is used, and the boundary period itself is always
    /// included. For [`Boundary::Start`] without a period the set is empty.
    #[must_use]
    pub fn period_ids(year_periods: &[Period], boundary: Boundary, period: Option<&Period>) -> BTreeSet<PeriodId> {
        let period = match (boundary, period) {
            (_, Some(p)) => Some(p),
            (Boundary::Start, None) => None,
            (Boundary::End, None) => year_periods
                .iter()
                .filter(|p| p.is_standard())
                .max_by_key(|p| p.start_date),
        };
        let Some(period) = period else {
            return BTreeSet::new();
        };

        let mut ids: BTreeSet<PeriodId> = year_periods
            .iter()
            .filter(|p| p.end_date <= period.start_date)
            .map(|p| p.id)
            .collect();
        if period.start_date == period.end_date || boundary == Boundary::End {
            ids.insert(period.id);
        }
        ids
    }

    /// Returns the periods between two boundaries, both inclusive:
    /// the end set minus the start set.
    #[must_use]
    pub fn period_window(year_periods: &[Period], start: Option<&Period>, end: Option<&Period>) -> BTreeSet<PeriodId> {
        let start_ids = Self::period_ids(year_periods, Boundary::Start, start);
        let end_ids = Self::period_ids(year_periods, Boundary::End, end);
        end_ids.difference(&start_ids).copied().collect()
    }
}
