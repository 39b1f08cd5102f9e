//! Record parsing
//!
//! Turns one raw input row into a [`Record`]. Parsing is a pure transform: a
//! failing row yields a [`ParseError`] identifying the column that failed, and
//! reporting it is left to the caller.

use crate::config::InputConfig;
use crate::domain::errors::{ParseError, TimestampField};
use crate::domain::ids::{KeyType, RecordKey};
use crate::domain::record::{parse_timestamp, Record};

/// Column order of an input file
///
/// With an id column the layout is `id, key, payload, created_at, updated_at`;
/// without one it is `key, payload, created_at, updated_at`. The id column is
/// never stored, it only helps locate failing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    has_id_column: bool,
}

impl ColumnLayout {
    pub fn new(has_id_column: bool) -> Self {
        Self { has_id_column }
    }

    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.has_id_column)
    }

    pub fn has_id_column(&self) -> bool {
        self.has_id_column
    }

    /// Number of columns every row must have
    pub fn width(&self) -> usize {
        self.offset() + 4
    }

    fn offset(&self) -> usize {
        usize::from(self.has_id_column)
    }

    fn key_index(&self) -> usize {
        self.offset()
    }

    fn payload_index(&self) -> usize {
        self.offset() + 1
    }

    fn created_at_index(&self) -> usize {
        self.offset() + 2
    }

    fn updated_at_index(&self) -> usize {
        self.offset() + 3
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Parses one row into a record
///
/// # Errors
///
/// - [`ParseError::MalformedRow`] when the column count differs from the layout
/// - [`ParseError::InvalidKey`] when the key does not fit `key_type`
/// - [`ParseError::InvalidTimestamp`] for the first timestamp column (created_at,
///   then updated_at) not in `YYYY-MM-DDTHH:MM:SSZ` form
///
/// # Examples
///
/// ```
/// use recsync::core::parse::{parse_row, ColumnLayout};
/// use recsync::domain::KeyType;
///
/// let row = ["1", "alice", "shown", "2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"];
/// let record = parse_row(&row, &ColumnLayout::default(), KeyType::String).unwrap();
/// assert_eq!(record.key.to_string(), "alice");
/// assert_eq!(record.payload, "shown");
/// ```
pub fn parse_row<S: AsRef<str>>(
    row: &[S],
    layout: &ColumnLayout,
    key_type: KeyType,
) -> Result<Record, ParseError> {
    if row.len() != layout.width() {
        return Err(ParseError::MalformedRow {
            expected: layout.width(),
            found: row.len(),
        });
    }

    let raw_key = row[layout.key_index()].as_ref();
    let key = RecordKey::parse(raw_key, key_type).map_err(|reason| ParseError::InvalidKey {
        value: raw_key.to_string(),
        reason,
    })?;

    let created_at = parse_column(
        row[layout.created_at_index()].as_ref(),
        TimestampField::CreatedAt,
        raw_key,
    )?;
    let updated_at = parse_column(
        row[layout.updated_at_index()].as_ref(),
        TimestampField::UpdatedAt,
        raw_key,
    )?;

    Ok(Record::new(
        key,
        row[layout.payload_index()].as_ref(),
        created_at,
        updated_at,
    ))
}

fn parse_column(
    value: &str,
    field: TimestampField,
    key: &str,
) -> Result<chrono::DateTime<chrono::Utc>, ParseError> {
    parse_timestamp(value).ok_or_else(|| ParseError::InvalidTimestamp {
        field,
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Id column of a row, when the layout has one and the row reaches it
pub fn row_id<'a, S: AsRef<str>>(row: &'a [S], layout: &ColumnLayout) -> Option<&'a str> {
    if !layout.has_id_column() {
        return None;
    }
    row.first().map(AsRef::as_ref).filter(|id| !id.is_empty())
}
