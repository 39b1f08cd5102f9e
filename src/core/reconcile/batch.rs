//! Batch buffer for deferred bulk inserts
//!
//! Records queued by the engine wait here until the buffer reaches its
//! capacity or the input ends, then go to the store in a single
//! [`insert_many`](RecordStore::insert_many) call.
//!
//! A failed flush is reported once for the whole batch, never retried or
//! split. The buffer is cleared either way, so the records of a failed batch
//! are lost and the run carries on with the next row.

use crate::adapters::database::RecordStore;
use crate::core::outcome::{Outcome, OutcomeReporter};
use crate::domain::ids::RecordKey;
use crate::domain::record::Record;
use std::time::Instant;

/// Result of a flush attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing to flush
    Empty,
    /// Every record was inserted
    Flushed(usize),
    /// The bulk insert failed; this many records were dropped
    Failed(usize),
}

/// Flush counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub batches_flushed: usize,
    pub failed_batches: usize,
}

/// Bounded ordered buffer of records awaiting bulk insertion
#[derive(Debug)]
pub struct BatchBuffer {
    records: Vec<Record>,
    capacity: usize,
    stats: BatchStats,
}

impl BatchBuffer {
    /// Create an empty buffer flushing at `capacity` records (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            stats: BatchStats::default(),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the buffer reached its flush threshold
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    /// Keys of the queued records, in queue order
    pub fn keys(&self) -> Vec<RecordKey> {
        self.records.iter().map(|r| r.key.clone()).collect()
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Flushes only when the threshold has been reached
    pub async fn flush_if_full(
        &mut self,
        store: &dyn RecordStore,
        reporter: &mut OutcomeReporter,
    ) -> FlushOutcome {
        if self.is_full() {
            self.flush(store, reporter).await
        } else {
            FlushOutcome::Empty
        }
    }

    /// Inserts every queued record in one call and clears the buffer
    ///
    /// On success each record is reported as inserted. On failure one
    /// batch-level failure naming every key is reported instead.
    pub async fn flush(
        &mut self,
        store: &dyn RecordStore,
        reporter: &mut OutcomeReporter,
    ) -> FlushOutcome {
        if self.records.is_empty() {
            return FlushOutcome::Empty;
        }

        let batch = std::mem::replace(&mut self.records, Vec::with_capacity(self.capacity));
        let started = Instant::now();

        match store.insert_many(&batch).await {
            Ok(written) => {
                if written != batch.len() {
                    tracing::warn!(
                        expected = batch.len(),
                        written,
                        "Store reported a different insert count than requested"
                    );
                }
                for record in batch.iter() {
                    reporter.report(Outcome::Inserted {
                        key: record.key.clone(),
                    });
                }
                self.stats.batches_flushed += 1;
                crate::log_batch_flush!(batch.len(), started.elapsed());
                FlushOutcome::Flushed(batch.len())
            }
            Err(e) => {
                let lost = batch.len();
                self.stats.failed_batches += 1;
                tracing::error!(count = lost, error = %e, "Bulk insert failed");
                reporter.report(Outcome::BatchFailed {
                    keys: batch.into_iter().map(|r| r.key).collect(),
                    cause: e.to_string(),
                });
                FlushOutcome::Failed(lost)
            }
        }
    }

    /// Drops every queued record, reporting each as abandoned
    ///
    /// Used when the run aborts before the final flush.
    pub fn abandon(&mut self, reporter: &mut OutcomeReporter) -> usize {
        let abandoned = std::mem::take(&mut self.records);
        let count = abandoned.len();
        for record in abandoned {
            reporter.report(Outcome::Abandoned { key: record.key });
        }
        count
    }
}
