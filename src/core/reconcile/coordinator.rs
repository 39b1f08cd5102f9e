//! Sync coordinator - main orchestrator for one run
//!
//! Reads the input one row at a time and drives each row through the parser,
//! the reconciliation engine and the batch buffer before reading the next.
//! After the input ends the buffer gets one final flush.
//!
//! A fatal error (failed lookup under the compare policy, unreadable input
//! stream) stops reading; records still queued are reported as abandoned
//! instead of flushed. A shutdown signal also stops reading, but the final
//! flush still happens.

use crate::adapters::database::{create_record_store, RecordStore};
use crate::adapters::input;
use crate::config::SyncConfig;
use crate::core::outcome::{Outcome, OutcomeReporter};
use crate::core::parse::{parse_row, row_id, ColumnLayout};
use crate::core::reconcile::batch::BatchBuffer;
use crate::core::reconcile::engine::ReconcileEngine;
use crate::core::reconcile::summary::RunSummary;
use crate::domain::{Result, SyncError};
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Sync coordinator
pub struct SyncCoordinator {
    config: SyncConfig,
    store: Arc<dyn RecordStore>,
    shutdown_signal: watch::Receiver<bool>,
}

impl SyncCoordinator {
    /// Create a coordinator connected to the configured store
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be created or reached
    pub async fn new(config: SyncConfig, shutdown_signal: watch::Receiver<bool>) -> Result<Self> {
        let store = create_record_store(&config).await?;
        Ok(Self::with_store(config, store, shutdown_signal))
    }

    /// Create a coordinator over an existing store
    pub fn with_store(
        config: SyncConfig,
        store: Arc<dyn RecordStore>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            store,
            shutdown_signal,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Execute a run against the configured input and outcome files
    ///
    /// # Errors
    ///
    /// Returns an error on setup failure: an outcome file or the input file
    /// cannot be opened, or the header row cannot be read. Failures after
    /// setup are reported in the returned summary.
    pub async fn execute(&self) -> Result<RunSummary> {
        let reporter = OutcomeReporter::open_files(
            &self.config.outcomes.success_log,
            &self.config.outcomes.failure_log,
        )?;
        let reader = input::open_reader(&self.config.input)?;

        tracing::info!(
            input = %self.config.input.path,
            policy = %self.config.reconcile.policy,
            batch_size = self.config.reconcile.batch_size,
            "Starting sync"
        );

        self.run(reader, reporter).await
    }

    /// Runs the reconciliation loop over an already opened reader
    ///
    /// # Errors
    ///
    /// Returns an error if the header row cannot be read
    pub async fn run<R: Read>(
        &self,
        mut reader: csv::Reader<R>,
        mut reporter: OutcomeReporter,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::new(
            self.config.reconcile.policy,
            self.config.application.dry_run,
        );

        let headers = reader
            .headers()
            .map_err(|e| SyncError::Input(format!("Failed to read header row: {e}")))?;
        if headers.is_empty() {
            return Err(SyncError::Input(
                "Failed to read header row: input is empty".to_string(),
            ));
        }

        reporter.set_dry_run(self.config.application.dry_run);
        let layout = ColumnLayout::from_config(&self.config.input);
        let key_type = self.config.input.key_type;
        let engine = ReconcileEngine::from_config(self.store.clone(), &self.config.reconcile);
        let mut buffer = BatchBuffer::new(self.config.reconcile.batch_size);
        let mut row = csv::StringRecord::new();
        let mut fatal: Option<SyncError> = None;

        loop {
            if *self.shutdown_signal.borrow() {
                tracing::warn!(
                    run_id = %summary.run_id,
                    rows_read = summary.rows_read,
                    "Shutdown requested, no further rows will be read"
                );
                summary.interrupted = true;
                break;
            }

            match reader.read_record(&mut row) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_io_error() => {
                    reporter.report(Outcome::ReadFailed {
                        line: e.position().map(|p| p.line()),
                        cause: e.to_string(),
                    });
                    fatal = Some(SyncError::Input(format!("Failed to read input: {e}")));
                    break;
                }
                Err(e) => {
                    summary.rows_read += 1;
                    reporter.report(Outcome::ReadFailed {
                        line: e.position().map(|p| p.line()),
                        cause: e.to_string(),
                    });
                    continue;
                }
            }

            summary.rows_read += 1;
            let line = row.position().map(|p| p.line());
            let fields: Vec<&str> = row.iter().collect();

            let record = match parse_row(&fields, &layout, key_type) {
                Ok(record) => record,
                Err(error) => {
                    reporter.report(Outcome::ParseFailed {
                        line,
                        row_id: row_id(&fields, &layout).map(str::to_string),
                        error,
                    });
                    continue;
                }
            };

            if let Err(e) = engine.reconcile(record, &mut buffer, &mut reporter).await {
                fatal = Some(e);
                break;
            }
        }

        match fatal {
            Some(error) => {
                let abandoned = buffer.abandon(&mut reporter);
                if abandoned > 0 {
                    tracing::warn!(
                        run_id = %summary.run_id,
                        abandoned,
                        "Queued records dropped without flushing"
                    );
                }
                summary.abort(error);
            }
            None => {
                buffer.flush(engine.store(), &mut reporter).await;
            }
        }

        reporter.flush();
        summary.absorb(reporter.tally(), buffer.stats());
        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::config::load_config_from_str;

    fn config(batch_size: usize) -> SyncConfig {
        load_config_from_str(&format!(
            "database_target = \"memory\"\n\
             [input]\npath = \"users.csv\"\n\
             [reconcile]\npolicy = \"compare\"\nbatch_size = {batch_size}\n"
        ))
        .unwrap()
    }

    fn coordinator(
        store: Arc<MemoryStore>,
        batch_size: usize,
    ) -> (SyncCoordinator, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (SyncCoordinator::with_store(config(batch_size), store, rx), tx)
    }

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes())
    }

    #[tokio::test]
    async fn test_empty_input_only_header() {
        let store = Arc::new(MemoryStore::new());
        let (coordinator, _tx) = coordinator(store.clone(), 10);
        let (reporter, success, failure) = OutcomeReporter::in_memory();

        let summary = coordinator
            .run(reader("id,key,payload,created_at,updated_at\n"), reporter)
            .await
            .unwrap();

        assert_eq!(summary.rows_read, 0);
        assert_eq!(store.total_calls(), 0);
        assert!(success.is_empty());
        assert!(failure.is_empty());
        assert!(summary.is_successful());
    }

    #[tokio::test]
    async fn test_empty_input_has_no_header() {
        let store = Arc::new(MemoryStore::new());
        let (coordinator, _tx) = coordinator(store.clone(), 10);
        let (reporter, success, failure) = OutcomeReporter::in_memory();

        let result = coordinator.run(reader(""), reporter).await;

        assert!(matches!(result, Err(SyncError::Input(ref msg)) if msg.contains("header")));
        assert_eq!(store.total_calls(), 0);
        assert!(success.is_empty());
        assert!(failure.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8_row_is_row_level() {
        let store = Arc::new(MemoryStore::new());
        let (coordinator, _tx) = coordinator(store.clone(), 10);
        let (reporter, success, failure) = OutcomeReporter::in_memory();

        let mut data = b"id,key,payload,created_at,updated_at\n1,al".to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b"ice,shown,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n");
        data.extend_from_slice(b"2,bob,shown,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n");

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_slice());
        let summary = coordinator.run(reader, reporter).await.unwrap();

        assert_eq!(summary.rows_read, 2);
        assert_eq!(summary.read_failures, 1);
        assert_eq!(summary.inserted, 1);
        assert_eq!(failure.len(), 1);
        assert_eq!(success.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_first_row() {
        let store = Arc::new(MemoryStore::new());
        let (coordinator, tx) = coordinator(store.clone(), 10);
        tx.send(true).unwrap();
        let (reporter, _success, _failure) = OutcomeReporter::in_memory();

        let summary = coordinator
            .run(
                reader(
                    "id,key,payload,created_at,updated_at\n\
                     1,alice,shown,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
                ),
                reporter,
            )
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.rows_read, 0);
        assert_eq!(store.total_calls(), 0);
    }
}
