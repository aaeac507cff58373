//! Move number formatting.

use serde::{Deserialize, Serialize};

/// Prefix and zero padding of a number sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceFormat {
    /// Text placed before the counter.
    pub prefix: String,
    /// Minimum width of the counter.
    pub padding: u32,
}

impl SequenceFormat {
    /// Creates a format.
    #[must_use]
    pub fn new(prefix: impl Into<String>, padding: u32) -> Self {
        Self {
            prefix: prefix.into(),
            padding,
        }
    }

    /// `prefix` followed by `value` left-padded with zeros.
    ///
    /// Values wider than the padding are printed in full.
    #[must_use]
    pub fn format(&self, value: i64) -> String {
        let width = self.padding as usize;
        format!("{}{value:0width$}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MV", 6, 1, "MV000001")]
    #[case("MV", 6, 123_456, "MV123456")]
    #[case("MV", 3, 12_345, "MV12345")]
    #[case("", 0, 7, "7")]
    #[case("2024/", 4, 42, "2024/0042")]
    fn test_format(#[case] prefix: &str, #[case] padding: u32, #[case] value: i64, #[case] expected: &str) {
        assert_eq!(SequenceFormat::new(prefix, padding).format(value), expected);
    }
}
