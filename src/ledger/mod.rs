//! Seen-item ledger
//!
//! The ledger is the durable set of every item identifier ever collected,
//! across all runs. It is loaded once as an immutable snapshot at run start
//! and appended to exactly once at finalize, so duplicate detection within
//! a run never touches the backing store.
//!
//! The same database carries a `runs` table recording each run's lifecycle.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteLedger;
pub use traits::{Ledger, LedgerError, LedgerResult};

/// A single row in the durable seen-item ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Deduplication identifier derived from the canonical listing URL
    pub identifier: String,

    /// Date the item was first collected (DD-MM-YYYY)
    pub first_seen: String,

    /// Canonical listing URL
    pub url: String,
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub new_items: u32,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Partial,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
