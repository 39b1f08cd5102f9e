//! PostgreSQL adapter implementing the record store trait

use crate::adapters::database::traits::{RecordStore, UpsertOutcome};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{InsertColumns, PostgreSQLDocument};
use crate::domain::errors::StoreError;
use crate::domain::ids::{KeyType, RecordKey};
use crate::domain::record::Record;
use async_trait::async_trait;
use std::sync::Arc;

/// PostgreSQL implementation of [`RecordStore`]
///
/// This wraps the PostgreSQLClient; documents are rows of the collection table.
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
    key_type: KeyType,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient, key_type: KeyType) -> Self {
        Self {
            client: Arc::new(client),
            key_type,
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

#[async_trait]
impl RecordStore for PostgreSQLAdapter {
    /// Updates the oldest document for the key, or inserts one
    ///
    /// Runs in one transaction holding a row lock on the matched document.
    async fn upsert(&self, record: &Record) -> Result<UpsertOutcome, StoreError> {
        let sql = self.client.sql();
        let key = record.key.to_stored();
        let failed = |e: tokio_postgres::Error| StoreError::UpsertFailed(format!("key {key}: {e}"));

        let mut conn = self.client.get_connection().await?;
        let tx = conn.transaction().await.map_err(failed)?;

        let existing = tx
            .query_opt(sql.select_first_for_update.as_str(), &[&key])
            .await
            .map_err(failed)?
            .map(|row| PostgreSQLDocument::from_row(&row))
            .transpose()?;

        let outcome = match existing {
            None => {
                tx.execute(
                    sql.insert_one.as_str(),
                    &[&key, &record.payload, &record.created_at, &record.updated_at],
                )
                .await
                .map_err(failed)?;
                UpsertOutcome::Inserted
            }
            Some(doc) if doc.matches(record) => UpsertOutcome::Unchanged,
            Some(doc) => {
                tx.execute(
                    sql.update_by_id.as_str(),
                    &[&doc.id, &record.payload, &record.created_at, &record.updated_at],
                )
                .await
                .map_err(failed)?;
                UpsertOutcome::Updated
            }
        };

        tx.commit().await.map_err(failed)?;

        tracing::debug!(key = %record.key, outcome = ?outcome, "PostgreSQL upsert");
        Ok(outcome)
    }

    async fn find_one(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        let conn = self.client.get_connection().await?;
        let stored = key.to_stored();

        let row = conn
            .query_opt(self.client.sql().find_latest.as_str(), &[&stored])
            .await
            .map_err(|e| StoreError::QueryFailed(format!("lookup of key {key} failed: {e}")))?;

        match row {
            Some(row) => {
                let doc = PostgreSQLDocument::from_row(&row)?;
                Ok(Some(doc.to_domain(self.key_type)?))
            }
            None => Ok(None),
        }
    }

    /// Inserts all records with one statement, so the batch commits or fails as a unit
    async fn insert_many(&self, records: &[Record]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let conn = self.client.get_connection().await?;
        let columns = InsertColumns::from_records(records);

        let inserted = conn
            .execute(
                self.client.sql().insert_many.as_str(),
                &[
                    &columns.keys,
                    &columns.payloads,
                    &columns.created_at,
                    &columns.updated_at,
                ],
            )
            .await
            .map_err(|e| StoreError::InsertFailed(e.to_string()))?;

        tracing::debug!(
            collection = %self.client.sql().table(),
            count = inserted,
            "PostgreSQL bulk insert"
        );

        usize::try_from(inserted).map_err(|e| StoreError::InsertFailed(e.to_string()))
    }
}
