//! Outcome reporting
//!
//! Every terminal outcome of a row (or of a batch) is written as one line to
//! one of two append-only sinks:
//!
//! - the **success** sink receives upserts, inserts and informational lines
//! - the **failure** sink receives parse, read, store and batch failures
//!
//! Lines look like `2024-01-01T00:00:00Z [SUCCESS] - Inserted record with key: alice`.
//! Each outcome is mirrored to `tracing` and tallied for the run summary.
//!
//! In dry-run mode nothing is written to the store, so writes are reported as
//! `[INFO] - Dry run: would insert ...` lines and the sinks never carry a
//! `[SUCCESS]` line. The tally still counts them as upserts and inserts.

pub mod sink;

pub use sink::{FileSink, MemorySink, OutcomeSink};

use crate::domain::errors::ParseError;
use crate::domain::ids::RecordKey;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Severity tag of an outcome line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

impl Severity {
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Success => "SUCCESS",
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Terminal outcome of a row or batch
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Upsert inserted or changed the record
    Upserted { key: RecordKey },

    /// Record written by a successful bulk insert
    Inserted { key: RecordKey },

    /// Upsert matched an identical record and nothing was queued
    AlreadyCurrent { key: RecordKey },

    /// Stored record is at least as recent as the incoming one
    NoUpdateNeeded { key: RecordKey },

    /// Row could not be parsed into a record
    ParseFailed {
        line: Option<u64>,
        row_id: Option<String>,
        error: ParseError,
    },

    /// Row could not be decoded from the input stream
    ReadFailed { line: Option<u64>, cause: String },

    /// Upsert failed for one record
    UpsertFailed { key: RecordKey, cause: String },

    /// Lookup failed; fatal for the run
    LookupFailed { key: RecordKey, cause: String },

    /// Bulk insert failed; every record of the batch is lost
    BatchFailed { keys: Vec<RecordKey>, cause: String },

    /// Queued record dropped because the run aborted before flushing
    Abandoned { key: RecordKey },
}

impl Outcome {
    pub fn severity(&self) -> Severity {
        match self {
            Outcome::Upserted { .. } | Outcome::Inserted { .. } => Severity::Success,
            Outcome::AlreadyCurrent { .. } | Outcome::NoUpdateNeeded { .. } => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// Message for a write that a dry run skipped, `None` for anything else
    pub fn dry_run_message(&self) -> Option<String> {
        match self {
            Outcome::Upserted { key } => {
                Some(format!("Dry run: would upsert record with key: {key}"))
            }
            Outcome::Inserted { key } => {
                Some(format!("Dry run: would insert record with key: {key}"))
            }
            _ => None,
        }
    }

    /// Human-readable message, without timestamp or tag
    pub fn message(&self) -> String {
        match self {
            Outcome::Upserted { key } => format!("Upserted record with key: {key}"),
            Outcome::Inserted { key } => format!("Inserted record with key: {key}"),
            Outcome::AlreadyCurrent { key } => {
                format!("Record already current, nothing written for key: {key}")
            }
            Outcome::NoUpdateNeeded { key } => format!("No update needed for key: {key}"),
            Outcome::ParseFailed {
                line,
                row_id,
                error,
            } => format!(
                "Skipping row{}{}: {}",
                describe_line(*line),
                row_id
                    .as_deref()
                    .map(|id| format!(" (id: {id})"))
                    .unwrap_or_default(),
                error
            ),
            Outcome::ReadFailed { line, cause } => {
                format!("Failed to read row{}: {}", describe_line(*line), cause)
            }
            Outcome::UpsertFailed { key, cause } => {
                format!("Failed to upsert record with key {key}: {cause}")
            }
            Outcome::LookupFailed { key, cause } => {
                format!("Failed to look up record with key {key}, aborting run: {cause}")
            }
            Outcome::BatchFailed { keys, cause } => format!(
                "Failed to insert batch of {} records (keys: {}): {}",
                keys.len(),
                join_keys(keys),
                cause
            ),
            Outcome::Abandoned { key } => {
                format!("Record with key {key} was queued but not inserted before the run aborted")
            }
        }
    }
}

fn describe_line(line: Option<u64>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

fn join_keys(keys: &[RecordKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats one sink line
pub fn format_line(at: DateTime<Utc>, severity: Severity, message: &str) -> String {
    format!(
        "{} [{}] - {}",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        severity.tag(),
        message
    )
}

/// Per-run outcome counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub upserted: usize,
    pub inserted: usize,
    pub unchanged: usize,
    pub parse_failures: usize,
    pub read_failures: usize,
    pub upsert_failures: usize,
    pub lookup_failures: usize,
    pub failed_batches: usize,
    pub records_lost: usize,
    pub abandoned: usize,
}

impl OutcomeTally {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Upserted { .. } => self.upserted += 1,
            Outcome::Inserted { .. } => self.inserted += 1,
            Outcome::AlreadyCurrent { .. } | Outcome::NoUpdateNeeded { .. } => {
                self.unchanged += 1
            }
            Outcome::ParseFailed { .. } => self.parse_failures += 1,
            Outcome::ReadFailed { .. } => self.read_failures += 1,
            Outcome::UpsertFailed { .. } => self.upsert_failures += 1,
            Outcome::LookupFailed { .. } => self.lookup_failures += 1,
            Outcome::BatchFailed { keys, .. } => {
                self.failed_batches += 1;
                self.records_lost += keys.len();
            }
            Outcome::Abandoned { .. } => self.abandoned += 1,
        }
    }

    /// Number of outcomes that went to the failure sink as record-level failures
    pub fn record_failures(&self) -> usize {
        self.parse_failures
            + self.read_failures
            + self.upsert_failures
            + self.lookup_failures
            + self.records_lost
            + self.abandoned
    }
}

/// Writes outcomes to the success and failure sinks
pub struct OutcomeReporter {
    success: Box<dyn OutcomeSink>,
    failure: Box<dyn OutcomeSink>,
    tally: OutcomeTally,
    dry_run: bool,
}

impl OutcomeReporter {
    pub fn new(success: Box<dyn OutcomeSink>, failure: Box<dyn OutcomeSink>) -> Self {
        Self {
            success,
            failure,
            tally: OutcomeTally::default(),
            dry_run: false,
        }
    }

    /// Reports writes as informational previews instead of successes
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Opens both file sinks
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened
    pub fn open_files(
        success_path: impl AsRef<std::path::Path>,
        failure_path: impl AsRef<std::path::Path>,
    ) -> crate::domain::Result<Self> {
        let success = FileSink::open(success_path)?;
        let failure = FileSink::open(failure_path)?;
        Ok(Self::new(Box::new(success), Box::new(failure)))
    }

    /// Reporter writing to two in-memory sinks, returned alongside it
    pub fn in_memory() -> (Self, MemorySink, MemorySink) {
        let success = MemorySink::new();
        let failure = MemorySink::new();
        let reporter = Self::new(Box::new(success.clone()), Box::new(failure.clone()));
        (reporter, success, failure)
    }

    /// Reports one outcome
    pub fn report(&mut self, outcome: Outcome) {
        self.report_at(Utc::now(), outcome);
    }

    fn report_at(&mut self, at: DateTime<Utc>, outcome: Outcome) {
        self.tally.record(&outcome);

        let (severity, message) = match outcome.dry_run_message() {
            Some(preview) if self.dry_run => (Severity::Info, preview),
            _ => (outcome.severity(), outcome.message()),
        };

        match severity {
            Severity::Success => tracing::debug!(outcome = %severity, "{message}"),
            Severity::Info => tracing::info!(outcome = %severity, "{message}"),
            Severity::Error => tracing::warn!(outcome = %severity, "{message}"),
        }

        let line = format_line(at, severity, &message);
        let sink = match severity {
            Severity::Success | Severity::Info => &mut self.success,
            Severity::Error => &mut self.failure,
        };

        if let Err(e) = sink.write_line(&line) {
            tracing::warn!(
                sink = %sink.describe(),
                error = %e,
                "Failed to write outcome line"
            );
        }
    }

    /// Flushes both sinks
    pub fn flush(&mut self) {
        for sink in [&mut self.success, &mut self.failure] {
            if let Err(e) = sink.flush() {
                tracing::warn!(sink = %sink.describe(), error = %e, "Failed to flush outcome sink");
            }
        }
    }

    pub fn tally(&self) -> &OutcomeTally {
        &self.tally
    }
}

impl Drop for OutcomeReporter {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::TimestampField;
    use chrono::TimeZone;
    use std::io;

    fn text(key: &str) -> RecordKey {
        RecordKey::Text(key.to_string())
    }

    struct BrokenSink;

    impl OutcomeSink for BrokenSink {
        fn write_line(&mut self, _line: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    #[test]
    fn test_format_line() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let line = format_line(at, Severity::Success, "Inserted record with key: alice");
        assert_eq!(
            line,
            "2024-01-01T00:00:00Z [SUCCESS] - Inserted record with key: alice"
        );
    }

    #[test]
    fn test_outcomes_routed_by_severity() {
        let (mut reporter, success, failure) = OutcomeReporter::in_memory();

        reporter.report(Outcome::Inserted { key: text("a") });
        reporter.report(Outcome::NoUpdateNeeded { key: text("b") });
        reporter.report(Outcome::UpsertFailed {
            key: text("c"),
            cause: "timeout".to_string(),
        });

        let success_lines = success.lines();
        assert_eq!(success_lines.len(), 2);
        assert!(success_lines[0].contains("[SUCCESS] - Inserted record with key: a"));
        assert!(success_lines[1].contains("[INFO] - No update needed for key: b"));

        let failure_lines = failure.lines();
        assert_eq!(failure_lines.len(), 1);
        assert!(failure_lines[0].contains("[ERROR]"));
        assert!(failure_lines[0].contains("key c"));
        assert!(failure_lines[0].contains("timeout"));
    }

    #[test]
    fn test_parse_failure_message_names_field_key_and_id() {
        let outcome = Outcome::ParseFailed {
            line: Some(3),
            row_id: Some("17".to_string()),
            error: ParseError::InvalidTimestamp {
                field: TimestampField::CreatedAt,
                key: "alice".to_string(),
                value: "not-a-date".to_string(),
            },
        };

        let message = outcome.message();
        assert!(message.contains("line 3"));
        assert!(message.contains("id: 17"));
        assert!(message.contains("created_at"));
        assert!(message.contains("alice"));
        assert_eq!(outcome.severity(), Severity::Error);
    }

    #[test]
    fn test_batch_failure_message_lists_keys() {
        let outcome = Outcome::BatchFailed {
            keys: vec![text("a"), RecordKey::Integer(2)],
            cause: "connection reset".to_string(),
        };
        assert_eq!(
            outcome.message(),
            "Failed to insert batch of 2 records (keys: a, 2): connection reset"
        );
    }

    #[test]
    fn test_tally_counts() {
        let (mut reporter, _success, _failure) = OutcomeReporter::in_memory();

        reporter.report(Outcome::Upserted { key: text("a") });
        reporter.report(Outcome::AlreadyCurrent { key: text("b") });
        reporter.report(Outcome::BatchFailed {
            keys: vec![text("c"), text("d")],
            cause: "down".to_string(),
        });
        reporter.report(Outcome::Abandoned { key: text("e") });

        let tally = reporter.tally();
        assert_eq!(tally.upserted, 1);
        assert_eq!(tally.unchanged, 1);
        assert_eq!(tally.failed_batches, 1);
        assert_eq!(tally.records_lost, 2);
        assert_eq!(tally.abandoned, 1);
        assert_eq!(tally.record_failures(), 3);
    }

    #[test]
    fn test_dry_run_reports_writes_as_info() {
        let (mut reporter, success, failure) = OutcomeReporter::in_memory();
        reporter.set_dry_run(true);

        reporter.report(Outcome::Upserted { key: text("a") });
        reporter.report(Outcome::Inserted { key: text("b") });
        reporter.report(Outcome::NoUpdateNeeded { key: text("c") });

        let lines = success.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| !l.contains("[SUCCESS]")));
        assert!(lines[0].contains("[INFO] - Dry run: would upsert record with key: a"));
        assert!(lines[1].contains("[INFO] - Dry run: would insert record with key: b"));
        assert!(lines[2].contains("[INFO] - No update needed for key: c"));
        assert!(failure.is_empty());

        let tally = reporter.tally();
        assert_eq!(tally.upserted, 1);
        assert_eq!(tally.inserted, 1);
        assert_eq!(tally.unchanged, 1);
    }

    #[test]
    fn test_sink_write_failure_is_not_fatal() {
        let success = MemorySink::new();
        let mut reporter = OutcomeReporter::new(Box::new(success.clone()), Box::new(BrokenSink));

        reporter.report(Outcome::ReadFailed {
            line: None,
            cause: "invalid utf-8".to_string(),
        });
        reporter.report(Outcome::Inserted { key: text("a") });

        assert_eq!(reporter.tally().read_failures, 1);
        assert_eq!(success.len(), 1);
    }
}
