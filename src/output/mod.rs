//! Output module for run summaries and ledger statistics
//!
//! This module handles:
//! - The summary printed after a crawl
//! - Human-readable byte sizes
//! - Ledger statistics for `--stats`

mod report;
pub mod stats;

pub use report::{format_file_size, format_run_summary, print_run_summary};
pub use stats::{load_statistics, print_statistics, LedgerStatistics};
