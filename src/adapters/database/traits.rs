//! Record store abstraction
//!
//! This module defines the trait that store adapters must implement to work
//! with recsync. The reconciliation core depends on exactly three operations.

use crate::domain::errors::StoreError;
use crate::domain::ids::RecordKey;
use crate::domain::record::Record;
use async_trait::async_trait;

/// Result of an update-or-insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No existing record matched; a new one was created
    Inserted,
    /// An existing record matched and at least one field changed
    Updated,
    /// An existing record matched and every field already had the new value
    Unchanged,
}

impl UpsertOutcome {
    /// Whether the store now holds a changed or new record
    pub fn is_write(&self) -> bool {
        !matches!(self, UpsertOutcome::Unchanged)
    }
}

/// Document collection holding records
///
/// "Not found" is never an error: [`find_one`](RecordStore::find_one)
/// returns `Ok(None)`, and any `Err` means the store itself failed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Atomically updates the record with the same key, or inserts it
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejected or failed the write.
    async fn upsert(&self, record: &Record) -> Result<UpsertOutcome, StoreError>;

    /// Finds the current record for a key
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than the key being absent.
    async fn find_one(&self, key: &RecordKey) -> Result<Option<Record>, StoreError>;

    /// Inserts all records as one unit
    ///
    /// Either every record is written or none is.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert failed; nothing was written.
    async fn insert_many(&self, records: &[Record]) -> Result<usize, StoreError>;
}
