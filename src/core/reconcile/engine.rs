//! Reconciliation engine
//!
//! Decides, per parsed record, whether it is written in place, queued for the
//! next bulk insert or left alone, then flushes the buffer once it is full.
//!
//! Two policies are supported:
//!
//! - [`ReconcilePolicy::Upsert`]: every record goes through an atomic
//!   update-or-insert. New or changed records are successes. Records the store
//!   already held unchanged are reported as current or, with
//!   [`UnchangedUpsert::Queue`], queued for bulk insert anyway.
//! - [`ReconcilePolicy::Compare`]: the stored record is looked up first. Absent
//!   records, and records whose stored `updated_at` is strictly before the
//!   incoming `created_at`, are queued; everything else needs no update. A
//!   failed lookup is fatal for the run.

use crate::adapters::database::{RecordStore, UpsertOutcome};
use crate::config::ReconcileConfig;
use crate::core::outcome::{Outcome, OutcomeReporter};
use crate::core::reconcile::batch::BatchBuffer;
use crate::core::reconcile::policy::{ReconcilePolicy, UnchangedUpsert};
use crate::domain::record::Record;
use crate::domain::Result;
use std::sync::Arc;

/// What happened to one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Written in place by an upsert
    Upserted(UpsertOutcome),
    /// Appended to the batch buffer
    Queued,
    /// Store already current; nothing written
    Skipped,
    /// Row-level store failure, already reported
    Failed,
}

/// Per-record decision policy bound to a store
pub struct ReconcileEngine {
    store: Arc<dyn RecordStore>,
    policy: ReconcilePolicy,
    unchanged_upsert: UnchangedUpsert,
}

impl ReconcileEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        policy: ReconcilePolicy,
        unchanged_upsert: UnchangedUpsert,
    ) -> Self {
        Self {
            store,
            policy,
            unchanged_upsert,
        }
    }

    pub fn from_config(store: Arc<dyn RecordStore>, config: &ReconcileConfig) -> Self {
        Self::new(store, config.policy, config.unchanged_upsert)
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Reconciles one record
    ///
    /// Queued records stay in `buffer`; when the buffer reaches its threshold
    /// it is flushed before this returns, so the buffer never holds a full
    /// batch between rows.
    ///
    /// # Errors
    ///
    /// Returns an error only when the run must stop: a failed lookup under
    /// the compare policy. The failure is reported before returning.
    pub async fn reconcile(
        &self,
        record: Record,
        buffer: &mut BatchBuffer,
        reporter: &mut OutcomeReporter,
    ) -> Result<Decision> {
        let decision = match self.policy {
            ReconcilePolicy::Upsert => self.upsert(record, buffer, reporter).await,
            ReconcilePolicy::Compare => self.compare(record, buffer, reporter).await?,
        };

        buffer.flush_if_full(self.store.as_ref(), reporter).await;
        Ok(decision)
    }

    async fn upsert(
        &self,
        record: Record,
        buffer: &mut BatchBuffer,
        reporter: &mut OutcomeReporter,
    ) -> Decision {
        match self.store.upsert(&record).await {
            Ok(outcome) if outcome.is_write() => {
                reporter.report(Outcome::Upserted { key: record.key });
                Decision::Upserted(outcome)
            }
            Ok(_) => match self.unchanged_upsert {
                UnchangedUpsert::Skip => {
                    reporter.report(Outcome::AlreadyCurrent { key: record.key });
                    Decision::Skipped
                }
                UnchangedUpsert::Queue => {
                    tracing::debug!(key = %record.key, "Upsert changed nothing, queueing record");
                    buffer.push(record);
                    Decision::Queued
                }
            },
            Err(e) => {
                reporter.report(Outcome::UpsertFailed {
                    key: record.key,
                    cause: e.to_string(),
                });
                Decision::Failed
            }
        }
    }

    async fn compare(
        &self,
        record: Record,
        buffer: &mut BatchBuffer,
        reporter: &mut OutcomeReporter,
    ) -> Result<Decision> {
        let existing = match self.store.find_one(&record.key).await {
            Ok(existing) => existing,
            Err(e) => {
                reporter.report(Outcome::LookupFailed {
                    key: record.key.clone(),
                    cause: e.to_string(),
                });
                return Err(e.into());
            }
        };

        match existing {
            Some(current) if current.updated_at >= record.created_at => {
                reporter.report(Outcome::NoUpdateNeeded { key: record.key });
                Ok(Decision::Skipped)
            }
            stale_or_absent => {
                // A stale record is refreshed by inserting a new document, not updated in place
                tracing::debug!(
                    key = %record.key,
                    refresh = stale_or_absent.is_some(),
                    "Queueing record for bulk insert"
                );
                buffer.push(record);
                Ok(Decision::Queued)
            }
        }
    }
}
