//! Record store factory
//!
//! This module creates the record store selected by configuration.

use crate::adapters::database::dry_run::DryRunStore;
use crate::adapters::database::traits::RecordStore;
use crate::adapters::memory::MemoryStore;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{DatabaseTarget, SyncConfig};
use crate::domain::{Result, SyncError};
use std::sync::Arc;

/// Create a record store based on the configuration
///
/// PostgreSQL stores are connected and their collection table created before
/// returning. With `application.dry_run` the store is wrapped in a
/// [`DryRunStore`].
///
/// # Errors
///
/// Returns an error if the store cannot be created or reached
pub async fn create_record_store(config: &SyncConfig) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.database_target {
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                SyncError::Configuration(
                    "postgresql configuration is required when database_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!(collection = %pg_config.collection, "Creating PostgreSQL record store");
            let client = PostgreSQLClient::new(pg_config.clone())?;
            client.test_connection().await?;
            if config.application.dry_run {
                tracing::info!("DRY RUN: skipping collection setup");
            } else {
                client.ensure_collection_exists().await?;
            }

            Arc::new(PostgreSQLAdapter::new(client, config.input.key_type))
        }
        DatabaseTarget::Memory => {
            tracing::info!("Creating in-memory record store");
            Arc::new(MemoryStore::new())
        }
    };

    if config.application.dry_run {
        tracing::warn!("Dry run enabled: no records will be written");
        return Ok(Arc::new(DryRunStore::new(store)));
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[tokio::test]
    async fn test_create_memory_store() {
        let config = load_config_from_str(
            "database_target = \"memory\"\n[input]\npath = \"users.csv\"\n",
        )
        .unwrap();

        let store = create_record_store(&config).await.unwrap();
        let found = store
            .find_one(&crate::domain::RecordKey::Integer(1))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
