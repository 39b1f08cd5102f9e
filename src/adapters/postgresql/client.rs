//! PostgreSQL client implementation
//!
//! This module provides the pooled connection to PostgreSQL and the setup of
//! the collection table.

use crate::adapters::postgresql::models::CollectionSql;
use crate::config::schema::PostgreSQLConfig;
use crate::domain::errors::StoreError;
use crate::domain::{Result, SyncError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::NoTls;

/// PostgreSQL client for recsync
///
/// Owns the connection pool and the SQL of the configured collection.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Statements for the collection table
    sql: CollectionSql,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// No connection is opened yet; use [`test_connection`](Self::test_connection).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string or collection name is invalid,
    /// or the TLS connector or pool cannot be built.
    pub fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .parse()
            .map_err(|e| {
                SyncError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        pg_config
            .connect_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .options(&format!(
                "-c statement_timeout={}",
                config.statement_timeout_seconds * 1000
            ));

        let sql = CollectionSql::new(&config.collection)?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match config.ssl_mode.as_str() {
            "disable" => {
                pg_config.ssl_mode(SslMode::Disable);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
            mode => {
                pg_config.ssl_mode(if mode == "require" {
                    SslMode::Require
                } else {
                    SslMode::Prefer
                });
                let connector = TlsConnector::builder().build().map_err(|e| {
                    SyncError::Configuration(format!("Failed to build TLS connector: {e}"))
                })?;
                Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
            }
        };

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                SyncError::Store(StoreError::ConnectionFailed(format!(
                    "Failed to create connection pool: {e}"
                )))
            })?;

        Ok(Self { pool, sql, config })
    }

    /// Test the connection to PostgreSQL
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be obtained or the test query fails.
    pub async fn test_connection(&self) -> std::result::Result<(), StoreError> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("Connection test failed: {e}")))?;

        tracing::info!(
            server = %self.connection_string_safe(),
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Create the collection table and its key index if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails.
    pub async fn ensure_collection_exists(&self) -> std::result::Result<(), StoreError> {
        let client = self.get_connection().await?;

        client
            .batch_execute(&self.sql.create_table)
            .await
            .map_err(|e| {
                StoreError::QueryFailed(format!(
                    "Failed to create collection {}: {e}",
                    self.sql.table()
                ))
            })?;

        tracing::info!(collection = %self.sql.table(), "PostgreSQL collection ready");
        Ok(())
    }

    /// Get a connection from the pool
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be obtained.
    pub async fn get_connection(&self) -> std::result::Result<deadpool_postgres::Object, StoreError> {
        self.pool.get().await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to get connection from pool: {e}"))
        })
    }

    pub fn sql(&self) -> &CollectionSql {
        &self.sql
    }

    /// Get the connection string (without credentials)
    pub fn connection_string_safe(&self) -> String {
        self.config.connection_string.expose_secret().redacted_url()
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}
