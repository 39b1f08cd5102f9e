//! Domain models and types for recsync.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Record keys** ([`RecordKey`], [`KeyType`]) for string or integer keyed deployments
//! - **The record model** ([`Record`]) and the fixed timestamp format
//! - **Error types** ([`SyncError`], [`StoreError`], [`ParseError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use recsync::domain::{KeyType, Record, RecordKey};
//! use recsync::domain::record::parse_timestamp;
//!
//! let ts = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
//! let key = RecordKey::parse("alice", KeyType::String).unwrap();
//! let record = Record::new(key, "displayed", ts, ts);
//! assert_eq!(record.key.to_string(), "alice");
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

pub use errors::{ParseError, StoreError, SyncError, TimestampField};
pub use ids::{KeyType, RecordKey};
pub use record::Record;
pub use result::Result;
