//! SQLite ledger implementation
//!
//! This module provides a SQLite-based implementation of the ProcessedLedger trait.

use crate::state::{ContentKind, CrawlState, ProcessStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ProcessedLedger, StorageError, StorageResult};
use crate::storage::{ProcessedRecord, RunRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// SQLite-backed processed-URL ledger
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Opens (or creates) a ledger database
    ///
    /// Missing parent directories are created. The database runs in WAL mode
    /// so that a second process can read while a crawl is writing.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory ledger (for tests and dry runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ProcessedRecord> {
    Ok(ProcessedRecord {
        url: row.get(0)?,
        status: ProcessStatus::from_db_string(&row.get::<_, String>(1)?)
            .unwrap_or(ProcessStatus::Error),
        content_kind: ContentKind::from_db_string(&row.get::<_, String>(2)?)
            .unwrap_or(ContentKind::Other),
        processed_at: row.get(3)?,
        error: row.get(4)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        seed: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        outcome: CrawlState::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(CrawlState::Running),
        html_processed: row.get::<_, i64>(6)? as u64,
        pdf_processed: row.get::<_, i64>(7)? as u64,
    })
}

impl ProcessedLedger for SqliteLedger {
    // ===== Lookup =====

    fn is_processed(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM processed_urls WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get_record(&self, url: &str) -> StorageResult<Option<ProcessedRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT url, status, content_type, processed_at, error
                 FROM processed_urls WHERE url = ?1",
                params![url],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn all_urls(&self) -> StorageResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM processed_urls")?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(urls)
    }

    // ===== Recording =====

    fn mark_processed(
        &mut self,
        url: &str,
        status: ProcessStatus,
        kind: ContentKind,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO processed_urls (url, status, content_type, processed_at, error)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(url) DO UPDATE SET
                status = excluded.status,
                content_type = excluded.content_type,
                processed_at = excluded.processed_at,
                error = excluded.error",
            params![url, status.to_db_string(), kind.to_db_string(), now, error],
        )?;
        Ok(())
    }

    // ===== Counting =====

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM processed_urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_status_and_type(
        &self,
        status: ProcessStatus,
        kind: ContentKind,
    ) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM processed_urls WHERE status = ?1 AND content_type = ?2",
            params![status.to_db_string(), kind.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn status_breakdown(&self) -> StorageResult<HashMap<(ProcessStatus, ContentKind), u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT status, content_type, COUNT(*) FROM processed_urls
             GROUP BY status, content_type",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut breakdown = HashMap::new();
        for row in rows {
            let (status_str, kind_str, count) = row?;
            if let (Some(status), Some(kind)) = (
                ProcessStatus::from_db_string(&status_str),
                ContentKind::from_db_string(&kind_str),
            ) {
                *breakdown.entry((status, kind)).or_insert(0) += count as u64;
            }
        }

        Ok(breakdown)
    }

    // ===== Run Tracking =====

    fn begin_run(&mut self, seed: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (seed, started_at, config_hash, outcome) VALUES (?1, ?2, ?3, ?4)",
            params![seed, now, config_hash, CrawlState::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        outcome: CrawlState,
        html_processed: u64,
        pdf_processed: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET finished_at = ?1, outcome = ?2, html_processed = ?3, pdf_processed = ?4
             WHERE id = ?5",
            params![
                now,
                outcome.to_db_string(),
                html_processed as i64,
                pdf_processed as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }

        Ok(())
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, seed, started_at, finished_at, config_hash, outcome,
                    html_processed, pdf_processed
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        assert_eq!(ledger.count().unwrap(), 0);
    }

    #[test]
    fn test_mark_and_lookup() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        ledger
            .mark_processed(
                "https://example.org/docs",
                ProcessStatus::Success,
                ContentKind::Html,
                None,
            )
            .unwrap();

        assert!(ledger.is_processed("https://example.org/docs").unwrap());
        assert!(!ledger.is_processed("https://example.org/docs/a").unwrap());

        let record = ledger.get_record("https://example.org/docs").unwrap().unwrap();
        assert_eq!(record.status, ProcessStatus::Success);
        assert_eq!(record.content_kind, ContentKind::Html);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_upsert_never_duplicates() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        let url = "https://example.org/report.pdf";

        ledger
            .mark_processed(url, ProcessStatus::Error, ContentKind::Pdf, Some("HTTP 503"))
            .unwrap();
        ledger
            .mark_processed(url, ProcessStatus::Success, ContentKind::Pdf, None)
            .unwrap();

        assert_eq!(ledger.count().unwrap(), 1);
        let record = ledger.get_record(url).unwrap().unwrap();
        assert_eq!(record.status, ProcessStatus::Success);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_count_by_status_and_type() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        ledger
            .mark_processed("https://a.org/1", ProcessStatus::Success, ContentKind::Html, None)
            .unwrap();
        ledger
            .mark_processed("https://a.org/2", ProcessStatus::Success, ContentKind::Html, None)
            .unwrap();
        ledger
            .mark_processed("https://a.org/3.pdf", ProcessStatus::Success, ContentKind::Pdf, None)
            .unwrap();
        ledger
            .mark_processed("https://a.org/4", ProcessStatus::Empty, ContentKind::Html, None)
            .unwrap();

        assert_eq!(
            ledger
                .count_by_status_and_type(ProcessStatus::Success, ContentKind::Html)
                .unwrap(),
            2
        );
        assert_eq!(
            ledger
                .count_by_status_and_type(ProcessStatus::Success, ContentKind::Pdf)
                .unwrap(),
            1
        );
        assert_eq!(
            ledger
                .count_by_status_and_type(ProcessStatus::Error, ContentKind::Html)
                .unwrap(),
            0
        );

        let breakdown = ledger.status_breakdown().unwrap();
        assert_eq!(breakdown.get(&(ProcessStatus::Empty, ContentKind::Html)), Some(&1));
        assert_eq!(breakdown.len(), 3);
    }

    #[test]
    fn test_all_urls() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        ledger
            .mark_processed("https://a.org/1", ProcessStatus::Success, ContentKind::Html, None)
            .unwrap();
        ledger
            .mark_processed("https://a.org/2", ProcessStatus::Skipped, ContentKind::Other, None)
            .unwrap();

        let urls = ledger.all_urls().unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://a.org/2"));
    }

    #[test]
    fn test_run_tracking() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        let first = ledger.begin_run("https://a.org", "hash1").unwrap();
        let second = ledger.begin_run("https://b.org", "hash1").unwrap();
        assert!(second > first);

        ledger
            .finish_run(first, CrawlState::BudgetReached, 3, 1)
            .unwrap();

        let runs = ledger.recent_runs(10).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[0].outcome, CrawlState::Running);
        assert!(runs[0].finished_at.is_none());
        assert_eq!(runs[1].outcome, CrawlState::BudgetReached);
        assert_eq!(runs[1].html_processed, 3);
        assert_eq!(runs[1].pdf_processed, 1);
        assert!(runs[1].finished_at.is_some());
    }

    #[test]
    fn test_finish_unknown_run() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        let result = ledger.finish_run(42, CrawlState::Exhausted, 0, 0);
        assert!(matches!(result, Err(StorageError::RunNotFound(42))));
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.db");

        {
            let mut ledger = SqliteLedger::open(&path).unwrap();
            ledger
                .mark_processed("https://a.org/1", ProcessStatus::Success, ContentKind::Html, None)
                .unwrap();
        }

        let ledger = SqliteLedger::open(&path).unwrap();
        assert!(ledger.is_processed("https://a.org/1").unwrap());
        assert_eq!(ledger.count().unwrap(), 1);
    }
}
