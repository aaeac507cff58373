//! Target configuration errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::Metric;

/// Errors raised while configuring or computing targets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    /// Span ends before it starts.
    #[error("Target span {from} → {to} ends before it starts")]
    InvalidSpan {
        /// Span start.
        from: NaiveDate,
        /// Span end.
        to: NaiveDate,
    },

    /// Target units are never negative.
    #[error("Target for {metric} cannot be negative: {value}")]
    NegativeUnit {
        /// Metric being configured.
        metric: Metric,
        /// Offending value.
        value: Decimal,
    },
}

impl TargetError {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSpan { .. } => "INVALID_TARGET_SPAN",
            Self::NegativeUnit { .. } => "NEGATIVE_TARGET",
        }
    }
}
