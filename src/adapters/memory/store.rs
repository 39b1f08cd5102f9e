//! Mutex-backed document collection

use crate::adapters::database::traits::{RecordStore, UpsertOutcome};
use crate::domain::errors::StoreError;
use crate::domain::ids::RecordKey;
use crate::domain::record::Record;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// In-memory document collection
///
/// Documents are kept in insertion order and keys are not unique, exactly like
/// the database collection: a bulk insert of an existing key adds a second
/// document.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<Record>>,
    fail_lookups: AtomicBool,
    fail_inserts: AtomicBool,
    fail_upserts: AtomicBool,
    find_one_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    insert_many_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with documents
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let store = Self::new();
        store.documents().extend(records);
        store
    }

    fn documents(&self) -> MutexGuard<'_, Vec<Record>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of every stored document, in insertion order
    pub fn records(&self) -> Vec<Record> {
        self.documents().clone()
    }

    /// Every stored document for a key, in insertion order
    pub fn records_for(&self, key: &RecordKey) -> Vec<Record> {
        self.documents()
            .iter()
            .filter(|r| &r.key == key)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }

    /// Makes every subsequent lookup fail (or succeed again)
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent bulk insert fail (or succeed again)
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent upsert fail (or succeed again)
    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn find_one_calls(&self) -> usize {
        self.find_one_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn insert_many_calls(&self) -> usize {
        self.insert_many_calls.load(Ordering::SeqCst)
    }

    /// Number of calls of any of the three store operations
    pub fn total_calls(&self) -> usize {
        self.find_one_calls() + self.upsert_calls() + self.insert_many_calls()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert(&self, record: &Record) -> Result<UpsertOutcome, StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store upserts disabled".to_string(),
            ));
        }

        let mut documents = self.documents();
        match documents.iter_mut().find(|r| r.key == record.key) {
            None => {
                documents.push(record.clone());
                Ok(UpsertOutcome::Inserted)
            }
            Some(existing) if existing.same_fields(record) => Ok(UpsertOutcome::Unchanged),
            Some(existing) => {
                existing.payload = record.payload.clone();
                existing.created_at = record.created_at;
                existing.updated_at = record.updated_at;
                Ok(UpsertOutcome::Updated)
            }
        }
    }

    async fn find_one(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        self.find_one_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::QueryFailed(
                "memory store lookups disabled".to_string(),
            ));
        }

        // Latest updated_at wins; on a tie the later document does
        Ok(self
            .documents()
            .iter()
            .filter(|r| &r.key == key)
            .fold(None::<&Record>, |latest, r| match latest {
                Some(l) if l.updated_at > r.updated_at => Some(l),
                _ => Some(r),
            })
            .cloned())
    }

    async fn insert_many(&self, records: &[Record]) -> Result<usize, StoreError> {
        self.insert_many_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::InsertFailed(
                "memory store inserts disabled".to_string(),
            ));
        }

        self.documents().extend_from_slice(records);
        Ok(records.len())
    }
}
