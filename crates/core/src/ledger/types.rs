//! Move and line records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tmi_shared::types::{CompanyId, GroupId, LineId, MetaGroupId, MoveId, PeriodId};

use super::metric::{Metric, MetricValues};

/// State of a move.
///
/// The valid transitions are:
/// - Draft → Quotation (quote)
/// - Draft → Canceled (cancel)
/// - Quotation → Posted (post)
/// - Quotation → Draft (draft)
/// - Quotation → Canceled (cancel)
/// - Posted → Quotation (quote, reopens a posted move)
/// - Canceled → Draft (draft)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveState {
    /// Being entered.
    Draft,
    /// Numbered and counted by reports.
    Quotation,
    /// Final; lines are read-only.
    Posted,
    /// Discarded.
    Canceled,
}

impl MoveState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Quotation => "quotation",
            Self::Posted => "posted",
            Self::Canceled => "canceled",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "quotation" => Some(Self::Quotation),
            "posted" => Some(Self::Posted),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for MoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived state of a line. Never set by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineState {
    /// Move still has draft work; not counted by aggregates.
    Draft,
    /// Counted by aggregates.
    Valid,
}

impl LineState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Valid => "valid",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "valid" => Some(Self::Valid),
            _ => None,
        }
    }
}

/// Declared control total: the lines of the move must add up to `amount`
/// for `metric`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlTotal {
    /// Metric being controlled.
    pub metric: Metric,
    /// Expected sum over the lines.
    pub amount: Decimal,
}

/// A dated posting for one church in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Unique identifier.
    pub id: MoveId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Assigned on quote.
    pub number: Option<String>,
    /// Assigned on first post.
    pub post_number: Option<String>,
    /// Effective date; inside the period.
    pub date: NaiveDate,
    /// Set on first post.
    pub post_date: Option<NaiveDate>,
    /// Free text.
    pub description: Option<String>,
    /// Workflow state.
    pub state: MoveState,
    /// Church node.
    pub group_id: MetaGroupId,
    /// Period the move reports into.
    pub period_id: PeriodId,
    /// Optional control total.
    pub control: Option<ControlTotal>,
}

impl Move {
    /// Name used in error messages: the number, else the id.
    #[must_use]
    pub fn label(&self) -> String {
        self.post_number
            .clone()
            .or_else(|| self.number.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// One small group's values inside a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Unique identifier.
    pub id: LineId,
    /// Owning move.
    pub move_id: MoveId,
    /// Small group the values belong to.
    pub group_id: GroupId,
    /// Derived state.
    pub state: LineState,
    /// Recorded values.
    pub values: MetricValues,
}
