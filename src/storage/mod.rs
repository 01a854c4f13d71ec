//! Storage module for persisting crawl results
//!
//! This module handles everything the crawler writes to disk:
//! - the SQLite ledger of processed URLs and crawl runs
//! - the append-only text artifact
//! - the reset operation that removes both

mod schema;
mod sqlite;
mod text_sink;
mod traits;

pub use sqlite::SqliteLedger;
pub use text_sink::{count_entries, format_record, FileTextSink, SinkError, TextSink};
pub use traits::{ProcessedLedger, StorageError, StorageResult};

use crate::state::{ContentKind, CrawlState, ProcessStatus};
use std::path::{Path, PathBuf};

/// Opens or creates the ledger database at `path`
pub fn open_ledger(path: &Path) -> StorageResult<SqliteLedger> {
    SqliteLedger::open(path)
}

/// Deletes the ledger (with its WAL side files) and the text artifact
///
/// Missing files are not an error.
///
/// # Returns
///
/// The paths that were actually removed
pub fn reset_outputs(ledger_path: &Path, text_path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut candidates = vec![ledger_path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut side = ledger_path.as_os_str().to_owned();
        side.push(suffix);
        candidates.push(PathBuf::from(side));
    }
    candidates.push(text_path.to_path_buf());

    let mut removed = Vec::new();
    for path in candidates {
        match std::fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    Ok(removed)
}

/// One row of the processed-URL ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub url: String,
    pub status: ProcessStatus,
    pub content_kind: ContentKind,
    pub processed_at: String,
    pub error: Option<String>,
}

/// One seed crawl as recorded in the ledger
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub seed: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub outcome: CrawlState,
    pub html_processed: u64,
    pub pdf_processed: u64,
}
