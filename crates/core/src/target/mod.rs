//! Target configuration.
//!
//! Every metric has a unit target per small group and month. Companies
//! may override the unit; otherwise [`DEFAULT_TARGET`] applies. A node's
//! target scales the unit by its small group count and the number of
//! months in the reporting span.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::TargetError;
pub use service::TargetService;
pub use types::{DEFAULT_TARGET, TargetConfiguration, TargetSpan};
