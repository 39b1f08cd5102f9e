//! PostgreSQL document models
//!
//! A collection is a table with one row per document. Keys are stored in
//! their canonical text form and are not unique: a refresh inserts a second
//! document for the same key.

use crate::config::schema::is_valid_identifier;
use crate::domain::errors::{StoreError, SyncError};
use crate::domain::ids::{KeyType, RecordKey};
use crate::domain::record::Record;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;

/// Document row of a collection table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgreSQLDocument {
    /// Surrogate row id
    pub id: i64,

    /// Canonical text form of the record key
    pub key: String,

    pub payload: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl PostgreSQLDocument {
    /// Maps a row selected with [`CollectionSql::DOCUMENT_COLUMNS`]
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        let invalid = |e: tokio_postgres::Error| StoreError::InvalidDocument(e.to_string());
        Ok(Self {
            id: row.try_get("id").map_err(invalid)?,
            key: row.try_get("key").map_err(invalid)?,
            payload: row.try_get("payload").map_err(invalid)?,
            created_at: row.try_get("created_at").map_err(invalid)?,
            updated_at: row.try_get("updated_at").map_err(invalid)?,
        })
    }

    /// Converts the document back into a domain record
    pub fn to_domain(self, key_type: KeyType) -> Result<Record, StoreError> {
        let key = RecordKey::from_stored(&self.key, key_type).map_err(|reason| {
            StoreError::InvalidDocument(format!(
                "document {} has key '{}' that is not a valid {} key: {}",
                self.id, self.key, key_type, reason
            ))
        })?;
        Ok(Record::new(key, self.payload, self.created_at, self.updated_at))
    }

    /// Whether the document already holds the record's field values
    pub fn matches(&self, record: &Record) -> bool {
        self.payload == record.payload
            && self.created_at == record.created_at
            && self.updated_at == record.updated_at
    }
}

/// SQL statements for one collection table
///
/// The table name is validated once and spliced into every statement; all
/// values go through bind parameters.
#[derive(Debug, Clone)]
pub struct CollectionSql {
    table: String,
    pub create_table: String,
    pub select_first_for_update: String,
    pub insert_one: String,
    pub update_by_id: String,
    pub find_latest: String,
    pub insert_many: String,
}

impl CollectionSql {
    pub const DOCUMENT_COLUMNS: &'static str = "id, key, payload, created_at, updated_at";

    /// Builds the statements for `table`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `table` is not a plain identifier
    pub fn new(table: &str) -> Result<Self, SyncError> {
        if !is_valid_identifier(table) {
            return Err(SyncError::Configuration(format!(
                "Invalid collection name '{table}'"
            )));
        }

        let columns = Self::DOCUMENT_COLUMNS;
        Ok(Self {
            table: table.to_string(),
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id BIGSERIAL PRIMARY KEY,
                    key TEXT NOT NULL,
                    payload TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table}_key ON {table} (key);"
            ),
            select_first_for_update: format!(
                "SELECT {columns} FROM {table} WHERE key = $1 ORDER BY id LIMIT 1 FOR UPDATE"
            ),
            insert_one: format!(
                "INSERT INTO {table} (key, payload, created_at, updated_at) VALUES ($1, $2, $3, $4)"
            ),
            update_by_id: format!(
                "UPDATE {table} SET payload = $2, created_at = $3, updated_at = $4 WHERE id = $1"
            ),
            find_latest: format!(
                "SELECT {columns} FROM {table} WHERE key = $1 ORDER BY updated_at DESC, id DESC LIMIT 1"
            ),
            insert_many: format!(
                "INSERT INTO {table} (key, payload, created_at, updated_at)
                 SELECT * FROM UNNEST($1::text[], $2::text[], $3::timestamptz[], $4::timestamptz[])"
            ),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Column arrays bound to the bulk insert statement
#[derive(Debug, Default)]
pub struct InsertColumns {
    pub keys: Vec<String>,
    pub payloads: Vec<String>,
    pub created_at: Vec<DateTime<Utc>>,
    pub updated_at: Vec<DateTime<Utc>>,
}

impl InsertColumns {
    pub fn from_records(records: &[Record]) -> Self {
        let mut columns = Self {
            keys: Vec::with_capacity(records.len()),
            payloads: Vec::with_capacity(records.len()),
            created_at: Vec::with_capacity(records.len()),
            updated_at: Vec::with_capacity(records.len()),
        };
        for record in records {
            columns.keys.push(record.key.to_stored());
            columns.payloads.push(record.payload.clone());
            columns.created_at.push(record.created_at);
            columns.updated_at.push(record.updated_at);
        }
        columns
    }
}
