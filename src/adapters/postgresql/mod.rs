//! PostgreSQL database integration
//!
//! This module stores a record collection in a PostgreSQL table.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
pub use models::{CollectionSql, PostgreSQLDocument};
