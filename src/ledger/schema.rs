//! Database schema definitions for the seen-item ledger

use rusqlite::Connection;

/// SQL schema for the ledger database
pub const SCHEMA_SQL: &str = r#"
-- Every item identifier ever collected, with provenance
CREATE TABLE IF NOT EXISTS seen_items (
    identifier TEXT PRIMARY KEY,
    first_seen TEXT NOT NULL,
    url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_seen_items_url ON seen_items(url);

-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    new_items INTEGER NOT NULL DEFAULT 0
);
"#;

/// Creates all tables and indexes if they do not already exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
