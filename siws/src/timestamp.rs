//! ISO-8601 timestamps for sign-in message validity windows.
//!
//! This module provides the [`IsoTimestamp`] type used for the `Issued At`,
//! `Expiration Time` and `Not Before` fields. A timestamp keeps the exact text
//! it was parsed from, because the serialized message must reproduce what the
//! wallet signed byte for byte, and it keeps the parsed instant alongside, so
//! temporal checks always compare instants and never strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::grammar;

/// Zoned date-time layouts accepted besides RFC 3339. `%#z` takes `Z`,
/// `+HH`, `+HHMM` and `+HH:MM`.
const ZONED_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y%m%dT%H%M%S%.f%#z",
    "%Y%m%dT%H%M%#z",
];

/// Date-time layouts without an offset, read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

/// Calendar dates, read as midnight UTC.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// An ISO-8601 timestamp that round-trips its original text.
///
/// # Accepted forms
///
/// - RFC 3339 date-times with a `Z` or numeric offset, e.g.
///   `2024-01-01T00:00:00Z` or `2024-01-01T02:00:00.250+02:00`
/// - ISO-8601 extended and basic date-times at minute or second
///   precision, with `Z`, `+HH`, `+HHMM` or `+HH:MM` offsets, e.g.
///   `2024-01-01T00:00Z`, `20240101T000000Z` or `2024-01-01T00:00:00+0000`
/// - Date-times without an offset, which are taken as UTC, e.g.
///   `2024-01-01T00:00:00`
/// - Calendar dates, taken as midnight UTC, e.g. `2024-01-01`
///
/// The text must be a single token. A space between date and time is
/// rejected, since a message carrying it would not parse back.
///
/// # Serialization
///
/// Serialized as the original string.
///
/// ```json
/// "2024-01-01T00:00:00Z"
/// ```
///
/// Equality, ordering and hashing use the instant, so two spellings of the same
/// moment compare equal.
#[derive(Debug, Clone)]
pub struct IsoTimestamp {
    raw: String,
    instant: DateTime<Utc>,
}

/// Error returned when a string is not a valid ISO-8601 date-time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid ISO-8601 timestamp {0:?}")]
pub struct TimestampFormatError(String);

impl IsoTimestamp {
    /// Parses an ISO-8601 date-time.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampFormatError`] if the text is not a supported date-time.
    pub fn parse(raw: &str) -> Result<Self, TimestampFormatError> {
        parse_iso8601(raw)
            .map(|instant| Self {
                raw: raw.to_owned(),
                instant,
            })
            .ok_or_else(|| TimestampFormatError(raw.to_owned()))
    }

    /// Creates a timestamp from an instant, rendered as RFC 3339 with
    /// millisecond precision and a `Z` suffix.
    ///
    /// The instant is truncated to milliseconds so it matches its text.
    #[must_use]
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        let instant = instant.trunc_subsecs(3);
        Self {
            raw: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            instant,
        }
    }

    /// Returns the current UTC time as an [`IsoTimestamp`].
    #[must_use]
    pub fn now() -> Self {
        Self::from_instant(Utc::now())
    }

    /// Returns the parsed instant.
    #[must_use]
    pub const fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Returns the original text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if !grammar::is_token(raw) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = ZONED_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(naive.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

impl FromStr for IsoTimestamp {
    type Err = TimestampFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DateTime<Utc>> for IsoTimestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::from_instant(instant)
    }
}

impl Display for IsoTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for IsoTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for IsoTimestamp {}

impl PartialOrd for IsoTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IsoTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl Hash for IsoTimestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

impl Serialize for IsoTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for IsoTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
