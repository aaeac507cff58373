//! Tracked metrics.
//!
//! The eight ministry statistics recorded on every line. Counts are whole
//! numbers; money follows the company currency precision.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tmi_shared::types::Digits;

/// A metric name that is not one of the eight tracked metrics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown metric: {0}")]
pub struct UnknownMetric(pub String);

/// A tracked metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Baptisms (count). Default sort key of printed reports.
    #[default]
    Baptism,
    /// Tithe (money).
    Tithe,
    /// Offering (money).
    Offering,
    /// Small groups held (count).
    SmallGroup,
    /// Gathering attendance (count).
    Gathering,
    /// Churches planted (count).
    ChurchPlanting,
    /// Churches organized (count).
    OrganizingChurch,
    /// Praise and thanksgiving (money).
    PraiseThanksgiving,
}

impl Metric {
    /// Every metric, in column order.
    pub const ALL: [Self; 8] = [
        Self::Baptism,
        Self::Tithe,
        Self::Offering,
        Self::SmallGroup,
        Self::Gathering,
        Self::ChurchPlanting,
        Self::OrganizingChurch,
        Self::PraiseThanksgiving,
    ];

    /// Returns the column / context name of the metric.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baptism => "baptism",
            Self::Tithe => "tithe",
            Self::Offering => "offering",
            Self::SmallGroup => "small_group",
            Self::Gathering => "gathering",
            Self::ChurchPlanting => "church_planting",
            Self::OrganizingChurch => "organizing_church",
            Self::PraiseThanksgiving => "praise_thanksgiving",
        }
    }

    /// Returns true for whole-number metrics.
    #[must_use]
    pub fn is_count(self) -> bool {
        !matches!(self, Self::Tithe | Self::Offering | Self::PraiseThanksgiving)
    }

    /// Decimal digits kept for this metric given the company currency.
    #[must_use]
    pub fn precision(self, currency: Digits) -> Digits {
        if self.is_count() { Digits::ZERO } else { currency }
    }

    /// Parses a list of names, failing on the first unknown one.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, UnknownMetric> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricValues {
    /// Baptisms.
    pub baptism: Decimal,
    /// Tithe.
    pub tithe: Decimal,
    /// Offering.
    pub offering: Decimal,
    /// Small groups.
    pub small_group: Decimal,
    /// Gathering.
    pub gathering: Decimal,
    /// Church planting.
    pub church_planting: Decimal,
    /// Organizing church.
    pub organizing_church: Decimal,
    /// Praise and thanksgiving.
    pub praise_thanksgiving: Decimal,
}

impl MetricValues {
    /// All zero.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Value of one metric.
    #[must_use]
    pub fn get(&self, metric: Metric) -> Decimal {
        match metric {
            Metric::Baptism => self.baptism,
            Metric::Tithe => self.tithe,
            Metric::Offering => self.offering,
            Metric::SmallGroup => self.small_group,
            Metric::Gathering => self.gathering,
            Metric::ChurchPlanting => self.church_planting,
            Metric::OrganizingChurch => self.organizing_church,
            Metric::PraiseThanksgiving => self.praise_thanksgiving,
        }
    }

    /// Mutable slot of one metric.
    pub fn get_mut(&mut self, metric: Metric) -> &mut Decimal {
        match metric {
            Metric::Baptism => &mut self.baptism,
            Metric::Tithe => &mut self.tithe,
            Metric::Offering => &mut self.offering,
            Metric::SmallGroup => &mut self.small_group,
            Metric::Gathering => &mut self.gathering,
            Metric::ChurchPlanting => &mut self.church_planting,
            Metric::OrganizingChurch => &mut self.organizing_church,
            Metric::PraiseThanksgiving => &mut self.praise_thanksgiving,
        }
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, metric: Metric, value: Decimal) -> Self {
        *self.get_mut(metric) = value;
        self
    }

    /// Adds every metric of `other` into `self`.
    pub fn accumulate(&mut self, other: &Self) {
        for metric in Metric::ALL {
            *self.get_mut(metric) += other.get(metric);
        }
    }

    /// Iterates `(metric, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, Decimal)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

impl std::iter::Sum for MetricValues {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |mut acc, v| {
            acc.accumulate(&v);
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(Metric::Baptism, 0)]
    #[case(Metric::SmallGroup, 0)]
    #[case(Metric::Gathering, 0)]
    #[case(Metric::ChurchPlanting, 0)]
    #[case(Metric::OrganizingChurch, 0)]
    #[case(Metric::Tithe, 2)]
    #[case(Metric::Offering, 2)]
    #[case(Metric::PraiseThanksgiving, 2)]
    fn test_precision_table(#[case] metric: Metric, #[case] digits: u32) {
        assert_eq!(metric.precision(Digits::CENTS), Digits(digits));
    }

    #[test]
    fn test_parse_names() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>(), Ok(metric));
        }
        assert_eq!(
            "baptisms".parse::<Metric>(),
            Err(UnknownMetric("baptisms".to_string()))
        );
        assert_eq!(
            Metric::parse_all(&["tithe", "offering"]).unwrap(),
            vec![Metric::Tithe, Metric::Offering]
        );
        assert!(Metric::parse_all(&["tithe", "nope"]).is_err());
    }

    #[test]
    fn test_values_accumulate() {
        let a = MetricValues::zero().with(Metric::Baptism, dec!(3)).with(Metric::Tithe, dec!(10.50));
        let b = MetricValues::zero().with(Metric::Baptism, dec!(5)).with(Metric::Offering, dec!(2));
        let total: MetricValues = [a, b].into_iter().sum();
        assert_eq!(total.get(Metric::Baptism), dec!(8));
        assert_eq!(total.get(Metric::Tithe), dec!(10.50));
        assert_eq!(total.get(Metric::Offering), dec!(2));
        assert_eq!(total.get(Metric::Gathering), dec!(0));
        assert_eq!(total.iter().count(), 8);
    }
}
