//! In-memory record store
//!
//! Keeps documents in process memory with the same semantics as the
//! PostgreSQL collection. Used by `database_target = "memory"` and by tests,
//! which can switch individual operations into failure to simulate outages.

pub mod store;

pub use store::MemoryStore;
