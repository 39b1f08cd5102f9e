//! Reconciliation of parsed records against the store
//!
//! The engine decides per record whether to upsert, skip or queue it; the
//! batch buffer collects queued records for bulk insertion and the
//! coordinator drives a whole run.

pub mod batch;
pub mod coordinator;
pub mod engine;
pub mod policy;
pub mod summary;

pub use batch::{BatchBuffer, BatchStats, FlushOutcome};
pub use coordinator::SyncCoordinator;
pub use engine::{Decision, ReconcileEngine};
pub use policy::{ReconcilePolicy, UnchangedUpsert};
pub use summary::RunSummary;
