//! Dry-run store wrapper
//!
//! Reads go to the wrapped store; writes are computed but never applied.

use crate::adapters::database::traits::{RecordStore, UpsertOutcome};
use crate::domain::errors::StoreError;
use crate::domain::ids::RecordKey;
use crate::domain::record::Record;
use async_trait::async_trait;
use std::sync::Arc;

/// Store that never writes
///
/// `upsert` derives the outcome it would have had from a lookup, and
/// `insert_many` reports every record as written without touching the store.
pub struct DryRunStore {
    inner: Arc<dyn RecordStore>,
}

impl DryRunStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RecordStore for DryRunStore {
    async fn upsert(&self, record: &Record) -> Result<UpsertOutcome, StoreError> {
        let outcome = match self.inner.find_one(&record.key).await? {
            None => UpsertOutcome::Inserted,
            Some(existing) if existing.same_fields(record) => UpsertOutcome::Unchanged,
            Some(_) => UpsertOutcome::Updated,
        };

        tracing::info!(key = %record.key, outcome = ?outcome, "DRY RUN: would upsert record");
        Ok(outcome)
    }

    async fn find_one(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        self.inner.find_one(key).await
    }

    async fn insert_many(&self, records: &[Record]) -> Result<usize, StoreError> {
        tracing::info!(
            count = records.len(),
            "DRY RUN: would insert {} records",
            records.len()
        );
        Ok(records.len())
    }
}
