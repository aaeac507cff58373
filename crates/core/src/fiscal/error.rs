//! Fiscal calendar error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by year and period rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FiscalError {
    // ========== Validation Errors ==========
    /// Start date after end date.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Two years of the same company overlap.
    #[error("Year \"{year}\" overlaps year \"{other}\"")]
    YearOverlaps {
        /// Year being validated.
        year: String,
        /// Existing year it collides with.
        other: String,
    },

    /// Two standard periods of the same year overlap.
    #[error("Period \"{period}\" overlaps period \"{other}\"")]
    PeriodOverlaps {
        /// Period being validated.
        period: String,
        /// Existing period it collides with.
        other: String,
    },

    /// Period dates fall outside the year.
    #[error("Dates of period \"{period}\" are outside year \"{year}\"")]
    PeriodOutsideYear {
        /// Offending period.
        period: String,
        /// Owning year.
        year: String,
    },

    /// Periods cannot be added to a closed year.
    #[error("Cannot create period \"{period}\" in closed year \"{year}\"")]
    CreatePeriodInClosedYear {
        /// Period being created.
        period: String,
        /// Closed year.
        year: String,
    },

    /// A period cannot be opened while its year is closed.
    #[error("Cannot open period \"{period}\" because year \"{year}\" is closed")]
    OpenPeriodInClosedYear {
        /// Period being opened.
        period: String,
        /// Closed year.
        year: String,
    },

    /// Dates or year of a period with moves cannot change.
    #[error("Cannot modify period \"{0}\" because it has moves")]
    ModifyPeriodWithMoves(String),

    /// A period with moves cannot be deleted.
    #[error("Cannot delete period \"{0}\" because it has moves")]
    DeletePeriodWithMoves(String),

    /// Period generation needs a positive month interval.
    #[error("Period interval must be at least one month, got {0}")]
    InvalidInterval(u32),

    // ========== State Errors ==========
    /// Period state change not in the transition table.
    #[error("Invalid period transition from {from} to {to}")]
    InvalidPeriodTransition {
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },

    /// Year is not in the state the operation needs.
    #[error("Year \"{year}\" is already {state}")]
    InvalidYearTransition {
        /// Year name.
        year: String,
        /// Current state.
        state: String,
    },

    /// An earlier year is still open.
    #[error("Cannot close year \"{year}\" because earlier year \"{earlier}\" is still open")]
    EarlierYearOpen {
        /// Year being closed.
        year: String,
        /// Earlier open year.
        earlier: String,
    },

    /// A later year is already closed.
    #[error("Cannot reopen year \"{year}\" because later year \"{later}\" is closed")]
    LaterYearClosed {
        /// Year being reopened.
        year: String,
        /// Later closed year.
        later: String,
    },

    // ========== Not Found ==========
    /// No year contains the date.
    #[error("No year defined for date {0}")]
    NoYearForDate(NaiveDate),

    /// No (open) standard period contains the date.
    #[error("No period defined for date {0}")]
    NoPeriodForDate(NaiveDate),
}

impl FiscalError {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::YearOverlaps { .. } => "YEAR_OVERLAPS",
            Self::PeriodOverlaps { .. } => "PERIOD_OVERLAPS",
            Self::PeriodOutsideYear { .. } => "PERIOD_OUTSIDE_YEAR",
            Self::CreatePeriodInClosedYear { .. } => "CREATE_PERIOD_CLOSED_YEAR",
            Self::OpenPeriodInClosedYear { .. } => "OPEN_PERIOD_CLOSED_YEAR",
            Self::ModifyPeriodWithMoves(_) => "MODIFY_PERIOD_WITH_MOVES",
            Self::DeletePeriodWithMoves(_) => "DELETE_PERIOD_WITH_MOVES",
            Self::InvalidInterval(_) => "INVALID_INTERVAL",
            Self::InvalidPeriodTransition { .. } => "INVALID_PERIOD_TRANSITION",
            Self::InvalidYearTransition { .. } => "INVALID_YEAR_TRANSITION",
            Self::EarlierYearOpen { .. } => "EARLIER_YEAR_OPEN",
            Self::LaterYearClosed { .. } => "LATER_YEAR_CLOSED",
            Self::NoYearForDate(_) => "NO_YEAR_DATE",
            Self::NoPeriodForDate(_) => "NO_PERIOD_DATE",
        }
    }

    /// Returns true for lookup failures.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoYearForDate(_) | Self::NoPeriodForDate(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(FiscalError::NoYearForDate(date).is_not_found());
        assert!(!FiscalError::InvalidInterval(0).is_not_found());
    }

    #[test]
    fn test_messages_name_the_records() {
        let err = FiscalError::EarlierYearOpen {
            year: "2025".into(),
            earlier: "2024".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot close year \"2025\" because earlier year \"2024\" is still open"
        );
        assert_eq!(err.error_code(), "EARLIER_YEAR_OPEN");
    }
}
