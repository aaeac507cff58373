//! Ledger error types for move and line rules.
//!
//! Messages name the offending move (its number, or its id before it has
//! one) so the caller can show them as-is.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::metric::{Metric, UnknownMetric};
use super::types::MoveState;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Move date outside its period.
    #[error("Date {date} of move \"{label}\" is outside its period")]
    DateOutsidePeriod {
        /// Move label.
        label: String,
        /// Offending date.
        date: NaiveDate,
    },

    /// Moves can only be recorded in open periods.
    #[error("Period \"{0}\" is not open")]
    PeriodNotOpen(String),

    /// A move is recorded against a church node.
    #[error("Move \"{label}\" must be recorded for a church, not \"{group}\"")]
    MoveGroupNotChurch {
        /// Move label.
        label: String,
        /// Node name.
        group: String,
    },

    /// Second move for the same church and period.
    #[error("A move already exists for \"{group}\" in period \"{period}\"")]
    DuplicateMove {
        /// Church name.
        group: String,
        /// Period name.
        period: String,
    },

    /// Lines must reference small groups.
    #[error("Line group \"{0}\" is not a small group")]
    LineGroupNotSmallGroup(String),

    /// Lines cannot reference inactive groups.
    #[error("Cannot record a line for inactive group \"{0}\"")]
    InactiveGroup(String),

    /// Value has more decimals than the metric allows.
    #[error("{metric} value {value} exceeds {digits} decimal digits")]
    PrecisionExceeded {
        /// Metric.
        metric: Metric,
        /// Offending value.
        value: Decimal,
        /// Allowed digits.
        digits: u32,
    },

    /// Lines do not add up to the declared control total.
    #[error("Move \"{label}\" is unbalanced by {difference}")]
    UnbalancedMove {
        /// Move label.
        label: String,
        /// Sum of lines minus declared amount.
        difference: Decimal,
    },

    /// Posting a move without lines.
    #[error("Cannot post move \"{0}\" because it has no lines")]
    PostEmptyMove(String),

    // ========== State Errors ==========
    /// Event not allowed from the current state.
    #[error("Invalid move transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: MoveState,
        /// Target state of the event.
        to: MoveState,
    },

    /// Posted moves and their lines are read-only.
    #[error("Cannot modify posted move \"{0}\"")]
    ModifyPostedMove(String),

    /// Deletion needs a canceled move.
    #[error("Move \"{0}\" must be canceled before deletion")]
    DeleteNotCanceled(String),

    /// Numbered history cannot be deleted.
    #[error("Move \"{0}\" has been posted and cannot be deleted")]
    DeleteNumberedMove(String),

    // ========== Internal ==========
    /// Metric name outside the closed set.
    #[error(transparent)]
    UnknownMetric(#[from] UnknownMetric),
}

impl LedgerError {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DateOutsidePeriod { .. } => "DATE_OUTSIDE_PERIOD",
            Self::PeriodNotOpen(_) => "PERIOD_NOT_OPEN",
            Self::MoveGroupNotChurch { .. } => "MOVE_GROUP_NOT_CHURCH",
            Self::DuplicateMove { .. } => "DUPLICATE_MOVE",
            Self::LineGroupNotSmallGroup(_) => "LINE_GROUP_NOT_SMALL_GROUP",
            Self::InactiveGroup(_) => "MOVE_INACTIVE_GROUP",
            Self::PrecisionExceeded { .. } => "PRECISION_EXCEEDED",
            Self::UnbalancedMove { .. } => "UNBALANCED_MOVE",
            Self::PostEmptyMove(_) => "POST_EMPTY_MOVE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ModifyPostedMove(_) => "MODIFY_POSTED_MOVE",
            Self::DeleteNotCanceled(_) => "DELETE_CANCEL",
            Self::DeleteNumberedMove(_) => "DELETE_NUMBERED",
            Self::UnknownMetric(_) => "UNKNOWN_METRIC",
        }
    }

    /// Returns true for contract violations that no user input can fix.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::UnknownMetric(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            LedgerError::PeriodNotOpen("p".into()),
            LedgerError::PostEmptyMove("m".into()),
            LedgerError::ModifyPostedMove("m".into()),
            LedgerError::DeleteNotCanceled("m".into()),
            LedgerError::DeleteNumberedMove("m".into()),
            LedgerError::InactiveGroup("g".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(LedgerError::error_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_unknown_metric_is_internal() {
        let err = LedgerError::from(UnknownMetric("foo".into()));
        assert!(err.is_internal());
        assert_eq!(err.to_string(), "Unknown metric: foo");
        assert!(!LedgerError::PostEmptyMove("m".into()).is_internal());
    }

    #[test]
    fn test_transition_message() {
        let err = LedgerError::InvalidTransition {
            from: MoveState::Posted,
            to: MoveState::Draft,
        };
        assert_eq!(err.to_string(), "Invalid move transition from posted to draft");
    }
}
