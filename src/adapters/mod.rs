//! External system integrations for recsync.
//!
//! - [`database`] - Record store abstraction (trait-based), factory and dry-run wrapper
//! - [`postgresql`] - PostgreSQL implementation
//! - [`memory`] - In-process implementation used for local runs and tests
//! - [`input`] - Delimited input file readers
//!
//! # Design Pattern
//!
//! The reconciliation engine only sees the [`database::RecordStore`] trait, so
//! backends can be swapped without touching the core.
//!
//! ```rust,no_run
//! use recsync::adapters::database::create_record_store;
//! use recsync::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("recsync.toml")?;
//! let store = create_record_store(&config).await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod input;
pub mod memory;
pub mod postgresql;
