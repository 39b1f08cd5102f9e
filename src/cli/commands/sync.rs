//! Sync command implementation
//!
//! This module implements the `sync` command, which reconciles the input file
//! into the configured record store.

use crate::cli::commands::{
    EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_RECORD_FAILURES, EXIT_STORE_ERROR,
    EXIT_SUCCESS,
};
use crate::config::{load_config, SyncConfig};
use crate::core::reconcile::{ReconcilePolicy, RunSummary, SyncCoordinator};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Override the input file path
    #[arg(short, long)]
    pub input: Option<String>,

    /// Override the batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Override the reconciliation policy (upsert or compare)
    #[arg(short, long)]
    pub policy: Option<ReconcilePolicy>,

    /// Dry run mode - read from the store but never write to it
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting sync command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG_ERROR);
        }

        if config.application.dry_run && !self.json {
            println!("🔍 DRY RUN MODE - No data will be written to the store");
            println!();
        }

        let coordinator = match SyncCoordinator::new(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to create record store");
                eprintln!("Failed to initialize sync: {e}");
                return Ok(if e.is_store_error() {
                    EXIT_STORE_ERROR
                } else {
                    EXIT_CONFIG_ERROR
                });
            }
        };

        if !self.json {
            println!("🚀 Starting sync of {}...", coordinator.config().input.path);
            println!();
        }

        let summary = match coordinator.execute().await {
            Ok(s) => s,
            Err(e) => {
                crate::log_error_with_context!(&e, "Sync setup failed");
                eprintln!("Sync failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }

        Ok(exit_code(&summary))
    }

    fn apply_overrides(&self, config: &mut SyncConfig) {
        if let Some(ref input) = self.input {
            tracing::info!(input = %input, "Overriding input path from CLI");
            config.input.path = input.clone();
        }

        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size, "Overriding batch size from CLI");
            config.reconcile.batch_size = batch_size;
        }

        if let Some(policy) = self.policy {
            tracing::info!(policy = %policy, "Overriding policy from CLI");
            config.reconcile.policy = policy;
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
    }
}

/// Maps a finished run to the process exit code
pub fn exit_code(summary: &RunSummary) -> i32 {
    if summary.interrupted {
        EXIT_INTERRUPTED
    } else if summary.aborted {
        EXIT_FATAL
    } else if summary.record_failures() > 0 {
        EXIT_RECORD_FAILURES
    } else {
        EXIT_SUCCESS
    }
}

fn print_summary(summary: &RunSummary) {
    println!("📊 Sync Summary:");
    println!("  Run ID: {}", summary.run_id);
    println!("  Policy: {}", summary.policy);
    println!("  Rows Read: {}", summary.rows_read);
    println!("  Upserted: {}", summary.upserted);
    println!("  Inserted: {}", summary.inserted);
    println!("  Unchanged: {}", summary.unchanged);
    println!("  Batches Flushed: {}", summary.batches_flushed);
    println!("  Parse Failures: {}", summary.parse_failures + summary.read_failures);
    println!("  Upsert Failures: {}", summary.upsert_failures);
    println!("  Lookup Failures: {}", summary.lookup_failures);
    println!(
        "  Failed Batches: {} ({} records lost)",
        summary.failed_batches, summary.records_lost
    );
    println!("  Duration: {:.2}s", summary.duration_ms as f64 / 1000.0);
    println!();

    if let Some(ref error) = summary.fatal_error {
        println!("❌ Sync aborted: {error}");
        println!("   {} queued records were not written", summary.abandoned);
    } else if summary.interrupted {
        println!("⚠️  Sync interrupted. Queued records were flushed before exit.");
    } else if summary.record_failures() > 0 {
        println!("⚠️  Sync completed with failures");
    } else {
        println!("✅ Sync completed successfully!");
    }
}
