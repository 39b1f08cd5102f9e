//! Core business logic for recsync.
//!
//! # Modules
//!
//! - [`parse`] - Converts delimited rows into typed records
//! - [`reconcile`] - Reconciliation policies, batch buffering and run coordination
//! - [`outcome`] - Success and failure outcome reporting
//!
//! # Sync Workflow
//!
//! 1. **Read**: Take the next row from the input file
//! 2. **Parse**: Build a [`Record`](crate::domain::Record) or report a parse failure
//! 3. **Reconcile**: Upsert the record, or look it up and queue it when the store is stale
//! 4. **Flush**: Bulk insert queued records once the batch size is reached
//! 5. **Report**: Write one outcome line per record or batch
//!
//! # Example
//!
//! ```rust,no_run
//! use recsync::config::load_config;
//! use recsync::core::reconcile::SyncCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("recsync.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = SyncCoordinator::new(config, shutdown_rx).await?;
//! let summary = coordinator.execute().await?;
//!
//! println!("Rows read: {}", summary.rows_read);
//! println!("Written: {}", summary.written());
//! println!("Failures: {}", summary.record_failures());
//! # Ok(())
//! # }
//! ```

pub mod outcome;
pub mod parse;
pub mod reconcile;
