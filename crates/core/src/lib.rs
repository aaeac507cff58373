//! Core business logic for TMI.
//!
//! This crate contains pure business logic with ZERO database dependencies.
//! All domain types, validation rules, and calculations live here; the `db`
//! crate loads records, calls into these modules inside a transaction, and
//! persists the outcome.
//!
//! # Modules
//!
//! - `fiscal` - Years, periods, period generation and period windows
//! - `organization` - The typed conference → small group hierarchy
//! - `ledger` - Moves, lines, metrics and the move state machine
//! - `target` - Per-company targets and target arithmetic
//! - `aggregation` - Recursive roll-up of line values through the hierarchy
//! - `clock` - The "today" service
//! - `sequence` - Move number formatting

pub mod aggregation;
pub mod clock;
pub mod fiscal;
pub mod ledger;
pub mod organization;
pub mod sequence;
pub mod target;
