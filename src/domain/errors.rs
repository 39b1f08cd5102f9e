//! Domain error types
//!
//! This module defines the error hierarchy for recsync. Errors are domain-specific
//! and don't expose third-party driver types to callers.

use std::fmt;
use thiserror::Error;

/// Main recsync error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Row parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Input file errors (open, header, unreadable stream)
    #[error("Input error: {0}")]
    Input(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Record store errors
///
/// Errors raised by [`RecordStore`](crate::adapters::database::RecordStore)
/// implementations. "Not found" is never an error; lookups return `Ok(None)`.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Failed to connect to the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// A lookup or schema query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// An update-or-insert failed
    #[error("Upsert failed: {0}")]
    UpsertFailed(String),

    /// A bulk insert failed as a unit
    #[error("Bulk insert failed: {0}")]
    InsertFailed(String),

    /// A stored document could not be mapped back to a record
    #[error("Invalid stored document: {0}")]
    InvalidDocument(String),

    /// The store is temporarily unavailable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Timestamp column of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    CreatedAt,
    UpdatedAt,
}

impl TimestampField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampField::CreatedAt => "created_at",
            TimestampField::UpdatedAt => "updated_at",
        }
    }
}

impl fmt::Display for TimestampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row parsing errors
///
/// Each variant identifies which part of the row failed. Parse errors are
/// row-level: the caller reports them and moves on to the next row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Row does not have the expected number of columns
    #[error("Malformed row: expected {expected} columns, found {found}")]
    MalformedRow { expected: usize, found: usize },

    /// Key column does not satisfy the configured key type
    #[error("Invalid key '{value}': {reason}")]
    InvalidKey { value: String, reason: String },

    /// Timestamp column does not match `YYYY-MM-DDTHH:MM:SSZ`
    #[error("Invalid {field} '{value}' for key {key}: expected format YYYY-MM-DDTHH:MM:SSZ")]
    InvalidTimestamp {
        field: TimestampField,
        key: String,
        value: String,
    },
}

impl ParseError {
    /// Raw key of the failing row, when the key column was readable
    pub fn key(&self) -> Option<&str> {
        match self {
            ParseError::MalformedRow { .. } => None,
            ParseError::InvalidKey { value, .. } => Some(value),
            ParseError::InvalidTimestamp { key, .. } => Some(key),
        }
    }
}

impl SyncError {
    /// Whether the error originated in the record store
    pub fn is_store_error(&self) -> bool {
        matches!(self, SyncError::Store(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

// Conversion from csv::Error
impl From<csv::Error> for SyncError {
    fn from(err: csv::Error) -> Self {
        SyncError::Input(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}
