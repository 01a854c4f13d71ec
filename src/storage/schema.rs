//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Scribe ledger.

/// SQL schema for the ledger database
pub const SCHEMA_SQL: &str = r#"
-- One row per normalized URL ever attempted
CREATE TABLE IF NOT EXISTS processed_urls (
    url TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    content_type TEXT NOT NULL,
    processed_at TEXT NOT NULL,
    error TEXT
);

CREATE INDEX IF NOT EXISTS idx_processed_status_type
    ON processed_urls(status, content_type);

-- One row per seed crawl
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    seed TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    outcome TEXT NOT NULL,
    html_processed INTEGER NOT NULL DEFAULT 0,
    pdf_processed INTEGER NOT NULL DEFAULT 0
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
