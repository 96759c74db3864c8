//! SQLite ledger implementation

use crate::ledger::schema::initialize_schema;
use crate::ledger::traits::{Ledger, LedgerError, LedgerResult};
use crate::ledger::{LedgerEntry, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;

/// SQLite-backed seen-item ledger
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Opens (or creates) the ledger database at the given path
    ///
    /// Missing parent directories are created, so a fresh checkout can run
    /// with the default `./data/ledger.db` path.
    pub fn new(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        initialize_schema(&conn).map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Creates an in-memory ledger (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Ledger for SqliteLedger {
    fn load_seen(&self) -> LedgerResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT identifier FROM seen_items")
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let mut seen = HashSet::new();
        for identifier in rows {
            seen.insert(identifier.map_err(|e| LedgerError::Unavailable(e.to_string()))?);
        }

        Ok(seen)
    }

    fn commit(&mut self, entries: &[LedgerEntry]) -> LedgerResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| LedgerError::Write(e.to_string()))?;

        for entry in entries {
            tx.execute(
                "INSERT INTO seen_items (identifier, first_seen, url) VALUES (?1, ?2, ?3)",
                params![entry.identifier, entry.first_seen, entry.url],
            )
            .map_err(|e| LedgerError::Write(e.to_string()))?;
        }

        tx.commit().map_err(|e| LedgerError::Write(e.to_string()))?;
        Ok(())
    }

    fn count_seen(&self) -> LedgerResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seen_items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Run Bookkeeping =====

    fn create_run(&mut self, config_hash: &str) -> LedgerResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> LedgerResult<RunRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status, new_items
             FROM runs WHERE id = ?1",
        )?;

        let run = stmt
            .query_row(params![run_id], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                    new_items: row.get(5)?,
                })
            })
            .map_err(|_| LedgerError::RunNotFound(run_id))?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus, new_items: u32) -> LedgerResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, new_items = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, new_items, run_id],
        )?;

        if updated == 0 {
            return Err(LedgerError::RunNotFound(run_id));
        }
        Ok(())
    }
}
