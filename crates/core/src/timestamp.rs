//! Fixed-format UTC timestamps.
//!
//! Stored documents carry timestamps as ISO-8601 strings without an
//! offset suffix and with fixed six-digit microseconds, e.g.
//! `2026-08-30T14:03:07.000512`. With every field fixed-width,
//! lexicographic order over the strings equals chronological order;
//! the retention sweep compares timestamps as strings and depends on
//! this. Any value read from or written to the store is normalized to
//! this exact shape; anything unparsable is rejected.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// strftime shape of the stored representation.
const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Errors from timestamp parsing/normalization.
#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("invalid timestamp {value:?}: {reason}")]
    Invalid { value: String, reason: String },
}

/// A UTC timestamp in the fixed stored representation.
///
/// `Ord` is derived over the inner string; because the format is
/// fixed-width this is also chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(String);

impl Timestamp {
    /// The current instant.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Normalize a `DateTime<Utc>` into the stored representation.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.naive_utc().format(FORMAT).to_string())
    }

    /// Parse and normalize a timestamp string.
    ///
    /// Accepts any ISO-8601 `YYYY-MM-DDTHH:MM:SS[.ffffff]` value in
    /// UTC (fractional seconds optional) and re-renders it in the
    /// fixed six-digit form, so that values written through different
    /// paths always compare correctly.
    pub fn parse(value: &str) -> Result<Self, TimestampError> {
        let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
            TimestampError::Invalid {
                value: value.to_owned(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self(naive.format(FORMAT).to_string()))
    }

    /// The stored string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert back into a `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        // The inner string is always in FORMAT, by construction.
        NaiveDateTime::parse_from_str(&self.0, FORMAT)
            .map(|naive| naive.and_utc())
            .unwrap_or_default()
    }
}

impl TryFrom<String> for Timestamp {
    type Error = TimestampError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn renders_fixed_width_microseconds() {
        let dt = Utc.with_ymd_and_hms(2026, 8, 30, 14, 3, 7).unwrap();
        let ts = Timestamp::from_datetime(dt);
        assert_eq!(ts.as_str(), "2026-08-30T14:03:07.000000");
    }

    #[test]
    fn normalizes_missing_fraction() {
        let ts = Timestamp::parse("2026-01-02T03:04:05").unwrap();
        assert_eq!(ts.as_str(), "2026-01-02T03:04:05.000000");
    }

    #[test]
    fn normalizes_short_fraction() {
        let ts = Timestamp::parse("2026-01-02T03:04:05.5").unwrap();
        assert_eq!(ts.as_str(), "2026-01-02T03:04:05.500000");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse("next tuesday").is_err());
        assert!(Timestamp::parse("2026-13-40T00:00:00").is_err());
    }

    #[test]
    fn string_order_matches_chronological_order() {
        let older = Timestamp::parse("2026-03-01T00:00:00.999999").unwrap();
        let newer = Timestamp::parse("2026-03-01T00:00:01").unwrap();
        assert!(older < newer);
        assert!(older.as_str() < newer.as_str());
        assert!(older.to_datetime() < newer.to_datetime());
    }

    #[test]
    fn serde_round_trip_normalizes() {
        let json = "\"2026-03-01T12:00:00\"";
        let ts: Timestamp = serde_json::from_str(json).unwrap();
        assert_eq!(ts.as_str(), "2026-03-01T12:00:00.000000");
        let back = serde_json::to_string(&ts).unwrap();
        assert_eq!(back, "\"2026-03-01T12:00:00.000000\"");
    }

    #[test]
    fn serde_rejects_invalid() {
        let result: Result<Timestamp, _> = serde_json::from_str("\"not a date\"");
        assert!(result.is_err());
    }

    #[test]
    fn datetime_round_trip() {
        let now = Timestamp::now();
        let via_dt = Timestamp::from_datetime(now.to_datetime());
        assert_eq!(now, via_dt);
    }
}
