//! Progress events emitted by the crawl engine

use crate::state::{ContentKind, CrawlState, ProcessStatus};

/// One step of crawl progress
///
/// Sent over an unbounded channel so the engine never waits on a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// A seed crawl began with this many pages left in the global budget
    Started { seed: String, remaining_budget: u64 },

    /// A ledger record was written
    Processed {
        /// Records written so far in this seed crawl
        count: u64,
        depth: u32,
        url: String,
        status: ProcessStatus,
        content_type: ContentKind,
        /// Bytes appended to the text artifact
        bytes: u64,
    },

    /// A seed crawl ended
    Finished {
        seed: String,
        state: CrawlState,
        html_processed: u64,
        pdf_processed: u64,
    },
}
