//! Hierarchical aggregation.
//!
//! Sums valid line values up the organization tree over a resolved period
//! window and compares them with the company targets.

pub mod context;
pub mod engine;
pub mod error;

#[cfg(test)]
mod engine_props;

pub use context::{DateWindow, LineFact, PeriodFilter, RequestContext, Scope};
pub use engine::{
    AggregationEngine, BalanceTable, MetricStatistic, NodeStatistics, ReportSection, parse_metrics,
};
pub use error::AggregationError;
