//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the recsync configuration file.

use crate::cli::commands::{EXIT_CONFIG_ERROR, EXIT_SUCCESS};
use crate::config::{load_config, DatabaseTarget};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates, so a load failure covers both parse and
    /// validation errors.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Input: {}", config.input.path);
        println!("  Delimiter: {:?}", config.input.delimiter);
        println!("  Id Column: {}", config.input.has_id_column);
        println!("  Key Type: {}", config.input.key_type);
        println!("  Policy: {}", config.reconcile.policy);
        println!("  Batch Size: {}", config.reconcile.batch_size);

        match config.database_target {
            DatabaseTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    use secrecy::ExposeSecret;
                    println!("  Database Target: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        pg_config.connection_string.expose_secret().redacted_url()
                    );
                    println!("  Collection: {}", pg_config.collection);
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
            DatabaseTarget::Memory => {
                println!("  Database Target: in-memory (discarded at exit)");
            }
        }

        println!("  Success Log: {}", config.outcomes.success_log);
        println!("  Failure Log: {}", config.outcomes.failure_log);
        println!();
        Ok(EXIT_SUCCESS)
    }
}
