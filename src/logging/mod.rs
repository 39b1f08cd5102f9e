//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output
//! - Configurable log levels
//! - Local JSON file logging with rotation
//!
//! Outcome lines (`success.log` / `errors.log`) are not written here; see
//! [`crate::core::outcome`].
//!
//! # Example
//!
//! ```no_run
//! use recsync::logging::init_logging;
//! use recsync::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the result of a bulk insert
///
/// # Example
///
/// ```no_run
/// use recsync::log_batch_flush;
/// use std::time::Duration;
///
/// log_batch_flush!(100, Duration::from_millis(42));
/// ```
#[macro_export]
macro_rules! log_batch_flush {
    ($count:expr, $duration:expr) => {
        tracing::info!(
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Batch flushed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use recsync::log_error_with_context;
/// use recsync::domain::SyncError;
///
/// let error = SyncError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
