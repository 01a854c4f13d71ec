//! Per-seed crawl results

use crate::state::{CrawlState, ProcessStatus};
use std::collections::BTreeMap;
use std::time::Duration;

/// Metrics for one link depth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthStats {
    /// URLs fetched (or attempted) at this depth
    pub attempted: u64,

    /// URLs whose text reached the artifact
    pub succeeded: u64,

    /// Characters of text extracted
    pub characters: u64,
}

/// What one seed crawl did
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Normalized seed URL
    pub seed: String,

    /// Terminal state the run ended in
    pub state: CrawlState,

    pub html_processed: u64,
    pub pdf_processed: u64,
    pub empty: u64,
    pub errors: u64,
    pub skipped: u64,

    /// Skipped records whose text matched an earlier page
    pub duplicates: u64,

    /// Ledger records written, whatever their status
    pub records_written: u64,

    /// URLs dropped because an earlier run already recorded them
    pub ledger_hits: u64,

    /// Bytes appended to the text artifact
    pub bytes_appended: u64,

    /// Frontier entries dropped when the budget ran out
    pub discarded: u64,

    pub elapsed: Duration,

    /// Keyed by depth, ascending
    pub depth_stats: BTreeMap<u32, DepthStats>,
}

impl CrawlReport {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            state: CrawlState::Running,
            html_processed: 0,
            pdf_processed: 0,
            empty: 0,
            errors: 0,
            skipped: 0,
            duplicates: 0,
            records_written: 0,
            ledger_hits: 0,
            bytes_appended: 0,
            discarded: 0,
            elapsed: Duration::ZERO,
            depth_stats: BTreeMap::new(),
        }
    }

    /// HTML plus PDF documents whose text was stored
    pub fn total_processed(&self) -> u64 {
        self.html_processed + self.pdf_processed
    }

    /// Counts one ledger record
    pub fn count_record(&mut self, status: ProcessStatus) {
        self.records_written += 1;
        match status {
            ProcessStatus::Success => {}
            ProcessStatus::Empty => self.empty += 1,
            ProcessStatus::Error => self.errors += 1,
            ProcessStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn depth_mut(&mut self, depth: u32) -> &mut DepthStats {
        self.depth_stats.entry(depth).or_default()
    }
}
