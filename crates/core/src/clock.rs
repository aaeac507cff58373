//! The "today" service.
//!
//! Default move dates, post dates and the default reporting year all
//! depend on the current date in the company's timezone. Tests pin it with
//! [`FixedClock`].

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Source of the current date.
pub trait Clock: std::fmt::Debug + Send + Sync {
    /// Current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Timezone name not found in the tz database.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown timezone: {0}")]
pub struct UnknownTimezone(pub String);

/// Wall clock in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    /// Clock in the given timezone.
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Clock in the named IANA timezone, e.g. `America/Lima`.
    ///
    /// # Errors
    ///
    /// `UnknownTimezone` when the name does not resolve.
    pub fn from_name(name: &str) -> Result<Self, UnknownTimezone> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| UnknownTimezone(name.to_string()))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

/// Clock frozen on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
