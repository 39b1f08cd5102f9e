//! Configuration management for recsync.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! recsync uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `RECSYNC_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use recsync::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("recsync.toml")?;
//!
//! println!("Input: {}", config.input.path);
//! println!("Batch size: {}", config.reconcile.batch_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run switch
//! - [`InputConfig`] - Input file path, delimiter, column layout and key type
//! - [`ReconcileConfig`] - Policy, batch size, unchanged-upsert handling
//! - [`PostgreSQLConfig`] - PostgreSQL connection and collection table
//! - [`OutcomeConfig`] - Success and failure sink files
//! - [`LoggingConfig`] - Local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! database_target = "postgresql"
//!
//! [input]
//! path = "users.csv"
//! key_type = "string"
//!
//! [reconcile]
//! policy = "upsert"
//! batch_size = 100
//!
//! [postgresql]
//! connection_string = "${RECSYNC_PG_URL}"
//! collection = "dialog_states"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, DatabaseTarget, Environment, InputConfig, LoggingConfig, OutcomeConfig,
    PostgreSQLConfig, ReconcileConfig, SyncConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
