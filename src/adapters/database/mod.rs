//! Record store abstraction layer
//!
//! This module provides the trait the reconciliation core talks to, the
//! dry-run wrapper and the factory choosing a backend (PostgreSQL, memory).

pub mod dry_run;
pub mod factory;
pub mod traits;

pub use dry_run::DryRunStore;
pub use factory::create_record_store;
pub use traits::{RecordStore, UpsertOutcome};
