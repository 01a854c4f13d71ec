//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: lifecycle of the crawl engine (idle, running, terminal states)
//! - `ProcessStatus`: outcome recorded in the ledger for each URL
//! - `ContentKind`: resource classification recorded alongside the outcome

mod crawl_state;
mod record_status;

// Re-export main types
pub use crawl_state::CrawlState;
pub use record_status::{ContentKind, ProcessStatus};
