//! Currency precision.
//!
//! Every monetary aggregate is rounded to the company currency's number of
//! decimal digits. Counts always use zero digits.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal digits of a currency (or of a count, which is 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digits(pub u32);

impl Digits {
    /// Whole numbers.
    pub const ZERO: Self = Self(0);

    /// Two decimal places, the common currency default.
    pub const CENTS: Self = Self(2);

    /// Rounds `amount` half-even to this precision and pins the scale, so
    /// `8` quantized to two digits displays as `8.00`.
    #[must_use]
    pub fn quantize(self, amount: Decimal) -> Decimal {
        let mut rounded = amount.round_dp_with_strategy(self.0, RoundingStrategy::MidpointNearestEven);
        rounded.rescale(self.0);
        rounded
    }

    /// Returns true when `amount` rounds to zero at this precision.
    #[must_use]
    pub fn is_zero(self, amount: Decimal) -> bool {
        self.quantize(amount).is_zero()
    }
}

impl Default for Digits {
    fn default() -> Self {
        Self::CENTS
    }
}
