// recsync - CSV to document collection reconciliation tool
// Copyright (c) 2025 recsync Contributors
// Licensed under the MIT License

//! # recsync - delimited records into a document collection
//!
//! recsync reads a delimited file of records and reconciles each one into a
//! document collection, reporting a success or failure line per record.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Parsing, reconciliation, batching and outcome reporting
//! - [`adapters`] - Record stores (PostgreSQL, in-memory) and input readers
//! - [`domain`] - Records, keys and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Policies
//!
//! - **upsert**: every record is written in place, inserting it when the key is new
//! - **compare**: the stored record is looked up first; records newer than it
//!   are queued and written in bulk once `batch_size` records are waiting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recsync::config::load_config;
//! use recsync::core::reconcile::SyncCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("recsync.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     let coordinator = SyncCoordinator::new(config, shutdown_rx).await?;
//!     let summary = coordinator.execute().await?;
//!
//!     println!("Wrote {} records", summary.written());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], whose error is [`domain::SyncError`].
//! Row-level failures never surface as errors; they are written to the failure
//! sink and counted in the [`core::reconcile::RunSummary`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
