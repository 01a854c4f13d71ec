//! Storage traits and error types
//!
//! This module defines the ledger interface the crawl engine records into
//! and the associated error types.

use crate::state::{ContentKind, CrawlState, ProcessStatus};
use crate::storage::{ProcessedRecord, RunRecord};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of every URL the crawler has attempted
///
/// Keys are normalized URL strings. Every write is an upsert, so several
/// crawls (or several processes) may share one ledger without assuming
/// exclusive access.
pub trait ProcessedLedger {
    // ===== Lookup =====

    /// Returns true if any record exists for this URL, whatever its status
    fn is_processed(&self, url: &str) -> StorageResult<bool>;

    /// Gets the record for a URL
    fn get_record(&self, url: &str) -> StorageResult<Option<ProcessedRecord>>;

    /// Gets every URL in the ledger
    fn all_urls(&self) -> StorageResult<HashSet<String>>;

    // ===== Recording =====

    /// Inserts or replaces the record for a URL
    ///
    /// # Arguments
    ///
    /// * `url` - The normalized URL
    /// * `status` - Outcome of the attempt
    /// * `kind` - Resource classification
    /// * `error` - Failure or skip reason, if any
    fn mark_processed(
        &mut self,
        url: &str,
        status: ProcessStatus,
        kind: ContentKind,
        error: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Counting =====

    /// Gets the total number of records
    fn count(&self) -> StorageResult<u64>;

    /// Counts records with the given status and content kind
    fn count_by_status_and_type(&self, status: ProcessStatus, kind: ContentKind)
        -> StorageResult<u64>;

    /// Gets the full status x kind matrix (absent pairs have no records)
    fn status_breakdown(&self) -> StorageResult<HashMap<(ProcessStatus, ContentKind), u64>>;

    // ===== Run Tracking =====

    /// Records the start of a seed crawl
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn begin_run(&mut self, seed: &str, config_hash: &str) -> StorageResult<i64>;

    /// Stores the terminal state and counters of a run
    fn finish_run(
        &mut self,
        run_id: i64,
        outcome: CrawlState,
        html_processed: u64,
        pdf_processed: u64,
    ) -> StorageResult<()>;

    /// Gets the most recent runs, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;
}
