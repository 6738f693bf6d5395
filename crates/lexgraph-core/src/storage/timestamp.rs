//! Timestamp encoding for TEXT columns
//!
//! All timestamps are written with a fixed width (microseconds, `Z` suffix) so
//! that string comparison in SQL matches chronological order.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// Encode a timestamp for storage
pub fn encode(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored timestamp
pub fn decode(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("Invalid timestamp '{}': {}", value, e)))
}

/// Decode an optional stored timestamp
pub fn decode_opt(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value.map(decode).transpose()
}

/// Calendar-day bucket (UTC) used as the daily metrics key
pub fn day_bucket(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Parse a day bucket back into a date
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::Other(format!("Invalid date '{}': {}", value, e)))
}
