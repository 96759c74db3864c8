//! Ledger trait and error types

use crate::ledger::{LedgerEntry, RunRecord, RunStatus};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing store could not be read; fatal at startup
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// The append could not complete; the run's records must not be exported
    #[error("Ledger write failed: {0}")]
    Write(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Trait for seen-item ledger backends
///
/// The ledger grows monotonically: entries are only ever appended, never
/// mutated or deleted. Membership checks during a run go against the
/// snapshot returned by `load_seen`, not the backing store.
pub trait Ledger {
    /// Loads every identifier ever committed, as the start-of-run snapshot
    fn load_seen(&self) -> LedgerResult<HashSet<String>>;

    /// Appends all given entries as a single transaction
    ///
    /// Either every entry becomes durable or none does; a partial append
    /// would leave identifiers the run could never export.
    fn commit(&mut self, entries: &[LedgerEntry]) -> LedgerResult<()>;

    /// Number of identifiers currently in the ledger
    fn count_seen(&self) -> LedgerResult<u64>;

    // ===== Run Bookkeeping =====

    /// Registers a new run as `running` and returns its ID
    fn create_run(&mut self, config_hash: &str) -> LedgerResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> LedgerResult<RunRecord>;

    /// Records the final status and new-item count of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus, new_items: u32) -> LedgerResult<()>;
}
