//! Request context and period window resolution.
//!
//! Every aggregation call receives an explicit [`RequestContext`]. The
//! window it carries is resolved once against the loaded years and periods
//! into a [`Scope`], which then decides line by line what is counted.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tmi_shared::types::{CompanyId, GroupId, LineId, MetaGroupId, MoveId, PeriodId, UserId, YearId};

use super::error::AggregationError;
use crate::fiscal::{FiscalService, Period, Year, YearState};
use crate::ledger::{LineState, MetricValues, MoveState};
use crate::target::TargetSpan;

/// Date window of a request. Empty means "all open years".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// As-of date: the containing year, moves dated on or before it.
    pub date: Option<NaiveDate>,
    /// Restrict to one year.
    pub year: Option<YearId>,
    /// Explicit period list. Empty means no period filter.
    pub periods: Vec<PeriodId>,
    /// First period of a range, inclusive.
    pub start_period: Option<PeriodId>,
    /// Last period of a range, inclusive.
    pub end_period: Option<PeriodId>,
    /// Moves dated on or after.
    pub from_date: Option<NaiveDate>,
    /// Moves dated on or before.
    pub to_date: Option<NaiveDate>,
}

impl DateWindow {
    /// Balance as of `date`.
    #[must_use]
    pub fn as_of(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// Explicit list of periods.
    #[must_use]
    pub fn periods(periods: impl IntoIterator<Item = PeriodId>) -> Self {
        Self {
            periods: periods.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Periods `start..=end` of `year`.
    #[must_use]
    pub fn period_range(year: YearId, start: Option<PeriodId>, end: Option<PeriodId>) -> Self {
        Self {
            year: Some(year),
            start_period: start,
            end_period: end,
            ..Self::default()
        }
    }

    /// Moves dated inside `[from, to]`.
    #[must_use]
    pub fn dates(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from_date: Some(from),
            to_date: Some(to),
            ..Self::default()
        }
    }

    /// Reporting default: the year containing `today`, if any.
    #[must_use]
    pub fn current_year(years: &[Year], today: NaiveDate) -> Self {
        Self {
            year: FiscalService::find_year(years, today).map(|y| y.id),
            ..Self::default()
        }
    }

    fn is_explicit(&self) -> bool {
        self.year.is_some()
            || !self.periods.is_empty()
            || self.start_period.is_some()
            || self.end_period.is_some()
            || self.from_date.is_some()
            || self.to_date.is_some()
    }
}

/// Everything an aggregation call depends on besides the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Company the request runs for.
    pub company_id: CompanyId,
    /// Period window.
    pub window: DateWindow,
    /// Count posted moves only.
    pub posted_only: bool,
    /// User issuing the request, if any.
    pub active_user: Option<UserId>,
}

impl RequestContext {
    /// Context over all open years, every non-draft move.
    #[must_use]
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            window: DateWindow::default(),
            posted_only: false,
            active_user: None,
        }
    }

    /// Reporting context: current year, posted moves only.
    #[must_use]
    pub fn report(company_id: CompanyId, years: &[Year], today: NaiveDate) -> Self {
        Self {
            company_id,
            window: DateWindow::current_year(years, today),
            posted_only: true,
            active_user: None,
        }
    }

    /// Replaces the window.
    #[must_use]
    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    /// Restricts to posted moves.
    #[must_use]
    pub fn posted(mut self, posted_only: bool) -> Self {
        self.posted_only = posted_only;
        self
    }

    /// Records the acting user.
    #[must_use]
    pub fn by(mut self, user: UserId) -> Self {
        self.active_user = Some(user);
        self
    }
}

/// One line as seen by the engine: its values plus the keys the window
/// filters on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFact {
    /// Line id.
    pub line_id: LineId,
    /// Small group of the line.
    pub group_id: GroupId,
    /// Node the group stands for.
    pub meta_id: MetaGroupId,
    /// Owning move.
    pub move_id: MoveId,
    /// Period of the move.
    pub period_id: PeriodId,
    /// Year of the period.
    pub year_id: YearId,
    /// Move date.
    pub move_date: NaiveDate,
    /// Move state.
    pub move_state: MoveState,
    /// Derived line state.
    pub line_state: LineState,
    /// Line values.
    pub values: MetricValues,
}

/// Which moves a resolved window admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodFilter {
    /// Moves of the year containing the date, dated on or before it. No
    /// containing year admits nothing.
    AsOf {
        /// Containing year.
        year: Option<YearId>,
        /// As-of date.
        date: NaiveDate,
    },
    /// Each bound applied when set.
    Explicit {
        /// Year restriction.
        year: Option<YearId>,
        /// Period restriction.
        periods: Option<BTreeSet<PeriodId>>,
        /// Lower date bound.
        from_date: Option<NaiveDate>,
        /// Upper date bound.
        to_date: Option<NaiveDate>,
    },
    /// Moves in any open year.
    OpenYears(BTreeSet<YearId>),
}

/// A resolved request: the filter plus the target span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Period filter.
    pub filter: PeriodFilter,
    /// Count posted moves only.
    pub posted_only: bool,
    /// Span targets are scaled over.
    pub span: TargetSpan,
}

impl Scope {
    /// Resolves a context against the company's years and periods.
    ///
    /// Priority: `date`, then the explicit bounds (`year`, `periods` or the
    /// `start_period`/`end_period` pair, `from_date`, `to_date`), then all
    /// open years.
    ///
    /// # Errors
    ///
    /// `PeriodNotFound` when a boundary period is not among `periods`,
    /// `ReversedWindow` when the start period begins after the end period.
    pub fn resolve(ctx: &RequestContext, years: &[Year], periods: &[Period]) -> Result<Self, AggregationError> {
        let window = &ctx.window;
        let span = TargetSpan {
            from: window.from_date,
            to: window.to_date,
        };

        let filter = if let Some(date) = window.date {
            PeriodFilter::AsOf {
                year: FiscalService::find_year(years, date).map(|y| y.id),
                date,
            }
        } else if window.is_explicit() {
            let selected = if window.periods.is_empty() {
                Self::range_ids(window, periods)?
            } else {
                window.periods.iter().copied().collect()
            };
            PeriodFilter::Explicit {
                year: window.year,
                periods: (!selected.is_empty()).then_some(selected),
                from_date: window.from_date,
                to_date: window.to_date,
            }
        } else {
            PeriodFilter::OpenYears(
                years
                    .iter()
                    .filter(|y| y.state == YearState::Open)
                    .map(|y| y.id)
                    .collect(),
            )
        };

        Ok(Self {
            filter,
            posted_only: ctx.posted_only,
            span,
        })
    }

    /// Period ids between the start and end boundary, empty without
    /// boundaries.
    fn range_ids(window: &DateWindow, periods: &[Period]) -> Result<BTreeSet<PeriodId>, AggregationError> {
        if window.start_period.is_none() && window.end_period.is_none() {
            return Ok(BTreeSet::new());
        }
        let lookup = |id: PeriodId| {
            periods
                .iter()
                .find(|p| p.id == id)
                .ok_or(AggregationError::PeriodNotFound(id))
        };
        let start = window.start_period.map(lookup).transpose()?;
        let end = window.end_period.map(lookup).transpose()?;
        if let (Some(s), Some(e)) = (start, end)
            && s.start_date > e.start_date
        {
            return Err(AggregationError::ReversedWindow);
        }

        let year_id = window
            .year
            .or_else(|| end.map(|p| p.year_id))
            .or_else(|| start.map(|p| p.year_id));
        let year_periods: Vec<Period> = periods
            .iter()
            .filter(|p| Some(p.year_id) == year_id)
            .cloned()
            .collect();
        Ok(FiscalService::period_window(&year_periods, start, end))
    }

    /// True if the line counts under this scope.
    ///
    /// Only valid lines count; the filter and the posted flag apply on top.
    #[must_use]
    pub fn admits(&self, fact: &LineFact) -> bool {
        if fact.line_state != LineState::Valid {
            return false;
        }
        if self.posted_only && fact.move_state != MoveState::Posted {
            return false;
        }
        match &self.filter {
            PeriodFilter::AsOf { year, date } => *year == Some(fact.year_id) && fact.move_date <= *date,
            PeriodFilter::Explicit {
                year,
                periods,
                from_date,
                to_date,
            } => {
                year.is_none_or(|y| y == fact.year_id)
                    && periods.as_ref().is_none_or(|p| p.contains(&fact.period_id))
                    && from_date.is_none_or(|d| fact.move_date >= d)
                    && to_date.is_none_or(|d| fact.move_date <= d)
            }
            PeriodFilter::OpenYears(years) => years.contains(&fact.year_id),
        }
    }
}
