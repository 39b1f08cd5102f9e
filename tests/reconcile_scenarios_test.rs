//! End-to-end reconciliation runs against the in-memory store
//!
//! Each test feeds a CSV document through the coordinator and checks the
//! store contents, the outcome lines and the run summary.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use recsync::adapters::database::{RecordStore, UpsertOutcome};
use recsync::adapters::input;
use recsync::adapters::memory::MemoryStore;
use recsync::config::{load_config_from_str, SyncConfig};
use recsync::core::outcome::{MemorySink, OutcomeReporter};
use recsync::core::reconcile::{RunSummary, SyncCoordinator};
use recsync::domain::{Record, RecordKey, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

const HEADER: &str = "id,key,payload,created_at,updated_at\n";

fn config(policy: &str, batch_size: usize) -> SyncConfig {
    load_config_from_str(&format!(
        "database_target = \"memory\"\n\
         [input]\npath = \"users.csv\"\n\
         [reconcile]\npolicy = \"{policy}\"\nbatch_size = {batch_size}\n"
    ))
    .unwrap()
}

fn key(value: &str) -> RecordKey {
    RecordKey::Text(value.to_string())
}

fn stored(key_value: &str, payload: &str, created: u32, updated: u32) -> Record {
    Record::new(
        key(key_value),
        payload,
        Utc.with_ymd_and_hms(2024, created, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, updated, 1, 0, 0, 0).unwrap(),
    )
}

struct RunOutput {
    summary: RunSummary,
    success: MemorySink,
    failure: MemorySink,
}

async fn run_with(
    config: SyncConfig,
    store: Arc<dyn RecordStore>,
    shutdown: watch::Receiver<bool>,
    rows: &str,
) -> RunOutput {
    let data = format!("{HEADER}{rows}");
    let reader = input::from_reader(&config.input, std::io::Cursor::new(data.into_bytes())).unwrap();
    let (reporter, success, failure) = OutcomeReporter::in_memory();

    let coordinator = SyncCoordinator::with_store(config, store, shutdown);
    let summary = coordinator.run(reader, reporter).await.unwrap();

    RunOutput {
        summary,
        success,
        failure,
    }
}

async fn run(config: SyncConfig, store: Arc<dyn RecordStore>, rows: &str) -> RunOutput {
    let (_tx, rx) = watch::channel(false);
    run_with(config, store, rx, rows).await
}

/// Store wrapper that scripts failures and records bulk insert sizes
#[derive(Default)]
struct ScriptedStore {
    inner: MemoryStore,
    fail_lookup_for: Option<RecordKey>,
    shutdown_after_lookups: Option<(usize, watch::Sender<bool>)>,
    lookups: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl ScriptedStore {
    fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for ScriptedStore {
    async fn upsert(&self, record: &Record) -> Result<UpsertOutcome, StoreError> {
        self.inner.upsert(record).await
    }

    async fn find_one(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        let seen = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, ref tx)) = self.shutdown_after_lookups {
            if seen >= after {
                let _ = tx.send(true);
            }
        }
        if self.fail_lookup_for.as_ref() == Some(key) {
            return Err(StoreError::QueryFailed("connection reset".to_string()));
        }
        self.inner.find_one(key).await
    }

    async fn insert_many(&self, records: &[Record]) -> Result<usize, StoreError> {
        self.batch_sizes.lock().unwrap().push(records.len());
        self.inner.insert_many(records).await
    }
}

#[tokio::test]
async fn test_two_new_rows_single_final_flush() {
    let store = Arc::new(MemoryStore::new());
    let out = run(
        config("compare", 100),
        store.clone(),
        "1,alice,shown,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         2,bob,hidden,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
    )
    .await;

    assert_eq!(store.find_one_calls(), 2);
    assert_eq!(store.insert_many_calls(), 1);
    assert_eq!(store.len(), 2);

    let lines = out.success.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("[SUCCESS] - Inserted record with key: alice"));
    assert!(lines[1].ends_with("[SUCCESS] - Inserted record with key: bob"));
    assert!(out.failure.is_empty());

    assert_eq!(out.summary.rows_read, 2);
    assert_eq!(out.summary.inserted, 2);
    assert_eq!(out.summary.batches_flushed, 1);
    assert!(out.summary.is_successful());
}

#[tokio::test]
async fn test_stored_record_newer_than_incoming() {
    let store = Arc::new(MemoryStore::with_records([stored("alice", "shown", 1, 6)]));
    let out = run(
        config("compare", 100),
        store.clone(),
        "1,alice,hidden,2024-05-01T00:00:00Z,2024-05-01T00:00:00Z\n",
    )
    .await;

    assert_eq!(store.insert_many_calls(), 0);
    assert_eq!(store.records_for(&key("alice")), vec![stored("alice", "shown", 1, 6)]);

    let lines = out.success.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("[INFO] - No update needed for key: alice"));
    assert_eq!(out.summary.unchanged, 1);
}

#[tokio::test]
async fn test_stored_record_older_than_incoming_is_inserted() {
    let store = Arc::new(MemoryStore::with_records([stored("alice", "shown", 1, 2)]));
    let out = run(
        config("compare", 100),
        store.clone(),
        "1,alice,hidden,2024-05-01T00:00:00Z,2024-05-01T00:00:00Z\n",
    )
    .await;

    // Bulk inserts add a document; the stale one stays
    assert_eq!(store.records_for(&key("alice")).len(), 2);
    assert_eq!(out.summary.inserted, 1);
}

#[tokio::test]
async fn test_invalid_timestamp_makes_no_store_call() {
    let store = Arc::new(MemoryStore::new());
    let out = run(
        config("compare", 100),
        store.clone(),
        "1,alice,shown,2024-13-45,2024-01-01T00:00:00Z\n",
    )
    .await;

    assert_eq!(store.total_calls(), 0);
    assert!(out.success.is_empty());

    let failures = out.failure.lines();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("[ERROR]"));
    assert!(failures[0].contains("created_at"));
    assert!(failures[0].contains("alice"));
    assert!(failures[0].contains("2024-13-45"));
    assert_eq!(out.summary.parse_failures, 1);
}

#[tokio::test]
async fn test_batch_of_two_with_three_rows() {
    let store = Arc::new(ScriptedStore::default());
    let out = run(
        config("compare", 2),
        store.clone(),
        "1,a,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         2,b,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         3,c,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
    )
    .await;

    assert_eq!(store.batch_sizes(), vec![2, 1]);
    assert_eq!(out.success.len(), 3);
    assert_eq!(out.summary.batches_flushed, 2);
    assert_eq!(store.inner.len(), 3);
}

#[tokio::test]
async fn test_batches_never_exceed_threshold() {
    let rows: String = (0..23)
        .map(|i| format!("{i},key{i},p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n"))
        .collect();
    let store = Arc::new(ScriptedStore::default());
    let out = run(config("compare", 5), store.clone(), &rows).await;

    let sizes = store.batch_sizes();
    assert_eq!(sizes, vec![5, 5, 5, 5, 3]);
    assert_eq!(sizes.iter().sum::<usize>(), 23);
    assert_eq!(out.summary.inserted, 23);
}

#[tokio::test]
async fn test_upsert_rerun_is_idempotent() {
    let rows = "1,alice,shown,2024-01-01T00:00:00Z,2024-01-02T00:00:00Z\n\
                2,bob,hidden,2024-01-01T00:00:00Z,2024-01-02T00:00:00Z\n";
    let store = Arc::new(MemoryStore::new());

    let first = run(config("upsert", 100), store.clone(), rows).await;
    let after_first = store.records();
    let second = run(config("upsert", 100), store.clone(), rows).await;

    assert_eq!(first.summary.upserted, 2);
    assert_eq!(second.summary.upserted, 0);
    assert_eq!(second.summary.unchanged, 2);
    assert_eq!(store.records(), after_first);
    assert_eq!(store.insert_many_calls(), 0);
}

#[tokio::test]
async fn test_compare_rerun_is_idempotent() {
    let rows = "1,alice,shown,2024-01-01T00:00:00Z,2024-01-02T00:00:00Z\n\
                2,bob,hidden,2024-01-01T00:00:00Z,2024-01-02T00:00:00Z\n";
    let store = Arc::new(MemoryStore::new());

    run(config("compare", 100), store.clone(), rows).await;
    let after_first = store.records();
    let second = run(config("compare", 100), store.clone(), rows).await;

    assert_eq!(second.summary.inserted, 0);
    assert_eq!(second.summary.unchanged, 2);
    assert_eq!(store.records(), after_first);
}

#[tokio::test]
async fn test_upsert_updates_in_place() {
    let store = Arc::new(MemoryStore::with_records([stored("alice", "shown", 1, 1)]));
    let out = run(
        config("upsert", 100),
        store.clone(),
        "1,alice,hidden,2024-01-01T00:00:00Z,2024-03-01T00:00:00Z\n",
    )
    .await;

    let docs = store.records_for(&key("alice"));
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].payload, "hidden");
    assert!(out.success.lines()[0].ends_with("Upserted record with key: alice"));
}

#[tokio::test]
async fn test_upsert_failure_is_row_level() {
    let store = Arc::new(MemoryStore::new());
    store.fail_upserts(true);
    let out = run(
        config("upsert", 100),
        store.clone(),
        "1,alice,shown,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         2,bob,shown,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
    )
    .await;

    assert_eq!(store.upsert_calls(), 2);
    assert_eq!(out.failure.len(), 2);
    assert_eq!(out.summary.upsert_failures, 2);
    assert!(!out.summary.aborted);
}

#[tokio::test]
async fn test_flush_failure_is_reported_and_run_continues() {
    let store = Arc::new(MemoryStore::new());
    store.fail_inserts(true);
    let out = run(
        config("compare", 2),
        store.clone(),
        "1,a,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         2,b,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         3,c,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
    )
    .await;

    // One line per failed batch, no retry
    let failures = out.failure.lines();
    assert_eq!(failures.len(), 2);
    assert!(failures[0].contains("Failed to insert batch of 2 records (keys: a, b)"));
    assert!(failures[1].contains("Failed to insert batch of 1 records (keys: c)"));
    assert_eq!(store.insert_many_calls(), 2);
    assert_eq!(store.find_one_calls(), 3);

    assert_eq!(out.summary.failed_batches, 2);
    assert_eq!(out.summary.records_lost, 3);
    assert!(!out.summary.aborted);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_lookup_failure_aborts_and_abandons_queue() {
    let store = Arc::new(ScriptedStore {
        fail_lookup_for: Some(key("b")),
        ..ScriptedStore::default()
    });
    let out = run(
        config("compare", 100),
        store.clone(),
        "1,a,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         2,b,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         3,c,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
    )
    .await;

    assert!(out.summary.aborted);
    assert!(out.summary.fatal_error.as_deref().unwrap().contains("connection reset"));
    assert_eq!(out.summary.rows_read, 2);
    assert_eq!(out.summary.abandoned, 1);
    assert_eq!(out.summary.lookup_failures, 1);
    assert_eq!(out.summary.record_failures(), 2);
    assert!(store.batch_sizes().is_empty());
    assert!(store.inner.is_empty());

    let failures = out.failure.lines();
    assert_eq!(failures.len(), 2);
    assert!(failures[0].contains("aborting run"));
    assert!(failures[1].contains("Record with key a was queued"));
}

#[tokio::test]
async fn test_shutdown_stops_reading_and_flushes_queue() {
    let (tx, rx) = watch::channel(false);
    let store = Arc::new(ScriptedStore {
        shutdown_after_lookups: Some((2, tx)),
        ..ScriptedStore::default()
    });
    let out = run_with(
        config("compare", 100),
        store.clone(),
        rx,
        "1,a,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         2,b,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         3,c,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
    )
    .await;

    assert!(out.summary.interrupted);
    assert_eq!(out.summary.rows_read, 2);
    assert_eq!(store.batch_sizes(), vec![2]);
    assert_eq!(out.success.len(), 2);
}

#[tokio::test]
async fn test_malformed_rows_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    let out = run(
        config("upsert", 100),
        store.clone(),
        "1,alice,shown\n\
         2,,shown,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         3,carol,shown,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
    )
    .await;

    assert_eq!(out.summary.rows_read, 3);
    assert_eq!(out.summary.parse_failures, 2);
    assert_eq!(out.summary.upserted, 1);
    assert_eq!(store.upsert_calls(), 1);

    let failures = out.failure.lines();
    assert!(failures[0].contains("expected 5 columns, found 3"));
    assert!(failures[0].contains("line 2"));
}

#[tokio::test]
async fn test_integer_keys() {
    let mut config = config("compare", 100);
    config.input.key_type = recsync::domain::KeyType::Integer;
    let store = Arc::new(MemoryStore::new());

    let out = run(
        config,
        store.clone(),
        "1,42,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n\
         2,forty-two,p,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
    )
    .await;

    assert_eq!(store.records_for(&RecordKey::Integer(42)).len(), 1);
    assert_eq!(out.summary.parse_failures, 1);
    assert!(out.failure.lines()[0].contains("forty-two"));
}
