//! Reconciliation policies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How incoming records are reconciled against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
    /// Update-or-insert every record in place
    #[default]
    Upsert,
    /// Look the record up and queue it for bulk insert when absent or stale
    Compare,
}

impl ReconcilePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcilePolicy::Upsert => "upsert",
            ReconcilePolicy::Compare => "compare",
        }
    }
}

impl fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReconcilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upsert" => Ok(ReconcilePolicy::Upsert),
            "compare" => Ok(ReconcilePolicy::Compare),
            other => Err(format!(
                "Invalid policy '{other}'. Must be one of: upsert, compare"
            )),
        }
    }
}

/// What the upsert policy does when the store matched an identical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnchangedUpsert {
    /// Report the record as already current and move on
    #[default]
    Skip,
    /// Queue the record for the next bulk insert anyway
    Queue,
}
