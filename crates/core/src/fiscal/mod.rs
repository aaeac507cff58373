//! Fiscal years and periods.
//!
//! # Modules
//!
//! - `period` - Year and period records and their states
//! - `calendar` - Month arithmetic and period generation
//! - `service` - Lookup, validation and period window rules
//! - `error` - Fiscal error types

pub mod calendar;
pub mod error;
pub mod period;
pub mod service;

#[cfg(test)]
mod service_props;

pub use calendar::{PeriodPlan, elapsed_months, last_day_of_month};
pub use error::FiscalError;
pub use period::{Period, PeriodState, PeriodType, Year, YearState};
pub use service::{Boundary, FiscalService, PeriodChanges};
