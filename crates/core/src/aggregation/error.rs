//! Aggregation errors.

use thiserror::Error;
use tmi_shared::types::PeriodId;

use crate::ledger::UnknownMetric;
use crate::organization::OrganizationError;
use crate::target::TargetError;

/// Errors raised while resolving a window or rolling up values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregationError {
    // ========== Not Found ==========
    /// Window references a period that was not loaded.
    #[error("Period not found: {0}")]
    PeriodNotFound(PeriodId),

    // ========== Validation ==========
    /// Start boundary after end boundary.
    #[error("Start period must not be after end period")]
    ReversedWindow,

    /// Tree lookup failure.
    #[error(transparent)]
    Organization(#[from] OrganizationError),

    /// Target computation failure.
    #[error(transparent)]
    Target(#[from] TargetError),

    // ========== Internal ==========
    /// Metric name outside the closed set.
    #[error(transparent)]
    UnknownMetric(#[from] UnknownMetric),
}

impl AggregationError {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::ReversedWindow => "REVERSED_WINDOW",
            Self::Organization(e) => e.error_code(),
            Self::Target(e) => e.error_code(),
            Self::UnknownMetric(_) => "UNKNOWN_METRIC",
        }
    }

    /// Returns true for contract violations that no user input can fix.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::UnknownMetric(_))
    }
}
