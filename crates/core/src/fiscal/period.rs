//! Fiscal year and period types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tmi_shared::types::{CompanyId, PeriodId, YearId};

/// State of a fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearState {
    /// Periods may be created and opened.
    Open,
    /// Closed; every period of the year has been closed too.
    Close,
}

impl YearState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "close" => Some(Self::Close),
            _ => None,
        }
    }
}

impl fmt::Display for YearState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a period.
///
/// Valid transitions:
/// - Open → Close
/// - Close → Locked
/// - Close → Open (only while the year is open)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodState {
    /// Moves may be created in the period.
    Open,
    /// No new moves; can still be reopened.
    Close,
    /// Final.
    Locked,
}

impl PeriodState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Locked => "locked",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "close" => Some(Self::Close),
            "locked" => Some(Self::Locked),
            _ => None,
        }
    }

    /// Returns true if `self → to` is an allowed transition.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Open, Self::Close) | (Self::Close, Self::Locked) | (Self::Close, Self::Open)
        )
    }
}

impl fmt::Display for PeriodState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Regular calendar slice of the year; never overlaps its siblings.
    Standard,
    /// Extra period for corrections; may overlap anything.
    Adjustment,
}

impl PeriodType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Adjustment => "adjustment",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// A fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Year {
    /// Unique identifier.
    pub id: YearId,
    /// Company whose calendar this is.
    pub company_id: CompanyId,
    /// Display name (e.g., "2024").
    pub name: String,
    /// First day of the year.
    pub start_date: NaiveDate,
    /// Last day of the year (inclusive).
    pub end_date: NaiveDate,
    /// Current state.
    pub state: YearState,
}

impl Year {
    /// Returns true if the year is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == YearState::Open
    }

    /// Returns true if the given date falls within this year.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// A period inside a fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Unique identifier.
    pub id: PeriodId,
    /// Owning year.
    pub year_id: YearId,
    /// Display name (e.g., "2024-01" or "2024-01 - 2024-03").
    pub name: String,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Current state.
    pub state: PeriodState,
    /// Standard or adjustment.
    pub period_type: PeriodType,
}

impl Period {
    /// Returns true if moves can be created in this period.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == PeriodState::Open
    }

    /// Returns true for standard periods.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        self.period_type == PeriodType::Standard
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Returns true if the inclusive ranges `[a_start, a_end]` and
/// `[b_start, b_end]` share at least one day.
#[must_use]
pub fn ranges_overlap(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start <= b_end && b_start <= a_end
}
