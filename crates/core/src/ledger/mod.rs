//! Move and line ledger.
//!
//! This module implements:
//! - The closed set of tracked metrics and their precision
//! - Move and line records
//! - The move workflow table
//! - Pure guards over a move and its lines
//! - Ledger service computing workflow outcomes and line states

pub mod error;
pub mod metric;
pub mod service;
pub mod types;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use metric::{Metric, MetricValues, UnknownMetric};
pub use service::{LedgerService, MoveAction};
pub use types::{ControlTotal, Line, LineState, Move, MoveState};
pub use workflow::{Guard, MoveEvent, SideEffect, Transition, TRANSITIONS};
