//! Typed configuration values consumed by the valset relayer.

use std::{fmt, str::FromStr, time::Duration};

use thiserror::Error;

/// The minimum time that must pass after a valset was created on Cosmos before it is relayed.
///
/// Parsed from a human readable duration such as `"0s"`, `"90s"` or `"1h 30m"`. A negative or
/// malformed duration is rejected when the value is parsed, so a constructed `RelayOffset` is
/// always valid.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct RelayOffset(Duration);

impl RelayOffset {
    /// An offset of zero, meaning valsets are relayed as soon as they are confirmed.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Create a new offset from a duration.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// Returns the offset as a duration.
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }
}

/// Errors that can occur parsing configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The duration string could not be parsed.
    #[error("invalid duration `{value}`: {source}")]
    InvalidDuration {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        #[source]
        source: humantime::DurationError,
    },
}

/// Parse a human readable, non-negative duration.
///
/// # Errors
/// Returns [`ConfigError::InvalidDuration`] if the input is empty, negative or malformed.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|source| ConfigError::InvalidDuration {
        value: value.to_string(),
        source,
    })
}

impl FromStr for RelayOffset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(Self)
    }
}

impl TryFrom<String> for RelayOffset {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelayOffset> for String {
    fn from(value: RelayOffset) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RelayOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", humantime::format_duration(self.0))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0s", Duration::ZERO)]
    #[case("90s", Duration::from_secs(90))]
    #[case("1h", Duration::from_secs(3600))]
    #[case("1h 30m", Duration::from_secs(5400))]
    #[case(" 15m ", Duration::from_secs(900))]
    fn parses_valid_offsets(#[case] input: &str, #[case] expected: Duration) {
        let offset: RelayOffset = input.parse().unwrap();
        assert_eq!(offset.as_duration(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("-1h")]
    #[case("ten minutes")]
    #[case("10")]
    fn rejects_malformed_offsets(#[case] input: &str) {
        let err = input.parse::<RelayOffset>().unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
    }

    #[test]
    fn deserializes_from_json_string() {
        let offset: RelayOffset = serde_json::from_str("\"2h\"").unwrap();
        assert_eq!(offset, RelayOffset::new(Duration::from_secs(7200)));
    }

    #[test]
    fn deserialization_fails_on_negative_offset() {
        let err = serde_json::from_str::<RelayOffset>("\"-5m\"").unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
    }

    #[test]
    fn serializes_back_to_human_readable() {
        let offset = RelayOffset::new(Duration::from_secs(5400));
        assert_eq!(serde_json::to_string(&offset).unwrap(), "\"1h 30m\"");
    }
}
