//! Run summary and reporting
//!
//! This module defines the structure tracking and reporting the result of one
//! sync run.

use crate::core::outcome::OutcomeTally;
use crate::core::reconcile::batch::BatchStats;
use crate::core::reconcile::policy::ReconcilePolicy;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Summary of a sync run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Unique id of the run, also attached to log lines
    pub run_id: Uuid,

    /// Policy the run used
    pub policy: ReconcilePolicy,

    /// Whether writes were suppressed
    pub dry_run: bool,

    /// Data rows read from the input (header excluded)
    pub rows_read: usize,

    /// Rows rejected by the parser
    pub parse_failures: usize,

    /// Rows the CSV reader could not decode
    pub read_failures: usize,

    /// Records written in place by an upsert
    pub upserted: usize,

    /// Records written by bulk inserts
    pub inserted: usize,

    /// Records already current in the store
    pub unchanged: usize,

    /// Upserts that failed
    pub upsert_failures: usize,

    /// Lookups that failed; at most one, since it stops the run
    pub lookup_failures: usize,

    /// Successful bulk inserts
    pub batches_flushed: usize,

    /// Failed bulk inserts
    pub failed_batches: usize,

    /// Records dropped with a failed batch
    pub records_lost: usize,

    /// Queued records dropped because the run aborted
    pub abandoned: usize,

    /// Duration of the run in milliseconds
    pub duration_ms: u64,

    /// Whether a fatal error stopped the run early
    pub aborted: bool,

    /// Whether a shutdown signal stopped the run early
    pub interrupted: bool,

    /// The fatal error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

impl RunSummary {
    /// Create a new empty run summary
    pub fn new(policy: ReconcilePolicy, dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            policy,
            dry_run,
            rows_read: 0,
            parse_failures: 0,
            read_failures: 0,
            upserted: 0,
            inserted: 0,
            unchanged: 0,
            upsert_failures: 0,
            lookup_failures: 0,
            batches_flushed: 0,
            failed_batches: 0,
            records_lost: 0,
            abandoned: 0,
            duration_ms: 0,
            aborted: false,
            interrupted: false,
            fatal_error: None,
        }
    }

    /// Copies the reporter and buffer counters into the summary
    pub fn absorb(&mut self, tally: &OutcomeTally, stats: BatchStats) {
        self.parse_failures = tally.parse_failures;
        self.read_failures = tally.read_failures;
        self.upserted = tally.upserted;
        self.inserted = tally.inserted;
        self.unchanged = tally.unchanged;
        self.upsert_failures = tally.upsert_failures;
        self.lookup_failures = tally.lookup_failures;
        self.records_lost = tally.records_lost;
        self.abandoned = tally.abandoned;
        self.batches_flushed = stats.batches_flushed;
        self.failed_batches = stats.failed_batches;
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Marks the run as stopped by a fatal error
    pub fn abort(&mut self, error: impl ToString) {
        self.aborted = true;
        self.fatal_error = Some(error.to_string());
    }

    /// Records written to the store, in place or in bulk
    pub fn written(&self) -> usize {
        self.upserted + self.inserted
    }

    /// Number of record-level failures
    pub fn record_failures(&self) -> usize {
        self.parse_failures
            + self.read_failures
            + self.upsert_failures
            + self.lookup_failures
            + self.records_lost
            + self.abandoned
    }

    /// Check if the run completed without any failure
    pub fn is_successful(&self) -> bool {
        !self.aborted && !self.interrupted && self.record_failures() == 0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            policy = %self.policy,
            dry_run = self.dry_run,
            rows_read = self.rows_read,
            upserted = self.upserted,
            inserted = self.inserted,
            unchanged = self.unchanged,
            batches_flushed = self.batches_flushed,
            duration_ms = self.duration_ms,
            "Sync completed"
        );

        if self.record_failures() > 0 {
            tracing::warn!(
                run_id = %self.run_id,
                parse_failures = self.parse_failures,
                read_failures = self.read_failures,
                upsert_failures = self.upsert_failures,
                lookup_failures = self.lookup_failures,
                failed_batches = self.failed_batches,
                records_lost = self.records_lost,
                abandoned = self.abandoned,
                "Sync completed with record failures"
            );
        }

        if let Some(ref error) = self.fatal_error {
            tracing::error!(run_id = %self.run_id, error = %error, "Sync aborted");
        }

        if self.interrupted {
            tracing::warn!(run_id = %self.run_id, "Sync interrupted by shutdown signal");
        }
    }
}
