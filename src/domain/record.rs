//! Record domain model
//!
//! A [`Record`] is the unit of work: one parsed input row. It is built once,
//! never mutated, and either written to the store directly or queued for a
//! bulk insert.

use super::ids::RecordKey;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Fixed timestamp format of input files (UTC, second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A reconciled record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Lookup key
    pub key: RecordKey,

    /// Display/status payload
    pub payload: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn new(
        key: RecordKey,
        payload: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            payload: payload.into(),
            created_at,
            updated_at,
        }
    }

    /// Whether `other` carries the same field values as this record
    ///
    /// Used by stores to tell an update that changed something from one that
    /// rewrote identical values.
    pub fn same_fields(&self, other: &Record) -> bool {
        self.payload == other.payload
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
    }
}

/// Parses a timestamp in the fixed `YYYY-MM-DDTHH:MM:SSZ` format
///
/// # Examples
///
/// ```
/// use recsync::domain::record::parse_timestamp;
///
/// assert!(parse_timestamp("2024-01-01T00:00:00Z").is_some());
/// assert!(parse_timestamp("2024-01-01T00:00:00.5Z").is_none());
/// assert!(parse_timestamp("not-a-date").is_none());
/// assert!(parse_timestamp("2024-1-1T0:0:0Z").is_none());
/// ```
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if !has_timestamp_shape(value.as_bytes()) {
        return None;
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Exactly `DDDD-DD-DDTDD:DD:DDZ`, seconds below 60
///
/// chrono alone accepts unpadded fields, surrounding space, a signed year and
/// leap seconds.
fn has_timestamp_shape(bytes: &[u8]) -> bool {
    const SEPARATORS: [(usize, u8); 6] = [
        (4, b'-'),
        (7, b'-'),
        (10, b'T'),
        (13, b':'),
        (16, b':'),
        (19, b'Z'),
    ];

    bytes.len() == 20
        && bytes.iter().enumerate().all(|(i, b)| {
            match SEPARATORS.iter().find(|(at, _)| *at == i) {
                Some((_, sep)) => b == sep,
                None => b.is_ascii_digit(),
            }
        })
        && bytes[17] <= b'5'
}
