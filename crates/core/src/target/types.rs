//! Target configuration records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tmi_shared::types::{CompanyId, SequenceId};

use super::error::TargetError;
use crate::ledger::Metric;

/// Unit target used when a company has no override for a metric.
pub const DEFAULT_TARGET: Decimal = Decimal::ONE;

/// Per-company configuration: target overrides and the move sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetConfiguration {
    /// Company the overrides belong to.
    pub company_id: Option<CompanyId>,
    /// Unit target per metric, per small group and month.
    pub overrides: BTreeMap<Metric, Decimal>,
    /// Sequence numbering the moves of the company.
    pub move_sequence_id: Option<SequenceId>,
}

impl TargetConfiguration {
    /// Configuration with no overrides.
    #[must_use]
    pub fn for_company(company_id: CompanyId) -> Self {
        Self {
            company_id: Some(company_id),
            ..Self::default()
        }
    }

    /// Unit target of a metric: the company override, else the default.
    #[must_use]
    pub fn unit(&self, metric: Metric) -> Decimal {
        self.overrides.get(&metric).copied().unwrap_or(DEFAULT_TARGET)
    }

    /// Sets the override for a metric.
    ///
    /// # Errors
    ///
    /// `NegativeUnit` for values below zero.
    pub fn set_unit(&mut self, metric: Metric, value: Decimal) -> Result<(), TargetError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(TargetError::NegativeUnit { metric, value });
        }
        self.overrides.insert(metric, value);
        Ok(())
    }
}

/// Date span a target is scaled over.
///
/// Targets are expressed per month; a span with both ends scales the unit
/// by the number of whole months between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetSpan {
    /// Inclusive start.
    pub from: Option<NaiveDate>,
    /// Inclusive end.
    pub to: Option<NaiveDate>,
}

impl TargetSpan {
    /// Span with both ends set.
    #[must_use]
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Span without dates: the months factor is omitted.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }
}
