//! Statistics generation from the ledger
//!
//! This module provides functionality for extracting and displaying
//! what the ledger has accumulated across every invocation.

use crate::output::format_file_size;
use crate::state::{ContentKind, ProcessStatus};
use crate::storage::{ProcessedLedger, RunRecord, StorageResult};
use crate::url::extract_domain;
use std::collections::HashMap;
use url::Url;

/// How many runs `--stats` lists
pub const RECENT_RUN_LIMIT: usize = 5;

/// Ledger statistics summary
#[derive(Debug, Clone)]
pub struct LedgerStatistics {
    /// Total number of records
    pub total_records: u64,

    /// Record counts by status and content kind
    pub by_status_and_kind: HashMap<(ProcessStatus, ContentKind), u64>,

    /// Record counts per host, largest first
    pub records_by_host: Vec<(String, u64)>,

    /// Size of the text artifact in bytes
    pub artifact_bytes: u64,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

impl LedgerStatistics {
    pub fn count(&self, status: ProcessStatus, kind: ContentKind) -> u64 {
        self.by_status_and_kind
            .get(&(status, kind))
            .copied()
            .unwrap_or(0)
    }

    /// Records with `status`, any content kind
    pub fn status_total(&self, status: ProcessStatus) -> u64 {
        ContentKind::all()
            .iter()
            .map(|kind| self.count(status, *kind))
            .sum()
    }

    /// Share of records with text stored, in percent
    pub fn success_rate(&self) -> f64 {
        percentage(self.status_total(ProcessStatus::Success), self.total_records)
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

/// Loads statistics from the ledger
///
/// # Arguments
///
/// * `ledger` - The ledger to query
/// * `artifact_bytes` - Current size of the text artifact
pub fn load_statistics<L>(ledger: &L, artifact_bytes: u64) -> StorageResult<LedgerStatistics>
where
    L: ProcessedLedger + ?Sized,
{
    let total_records = ledger.count()?;
    let by_status_and_kind = ledger.status_breakdown()?;

    let mut hosts: HashMap<String, u64> = HashMap::new();
    for url in ledger.all_urls()? {
        let host = Url::parse(&url)
            .ok()
            .and_then(|parsed| extract_domain(&parsed))
            .unwrap_or_else(|| "(unparseable)".to_string());
        *hosts.entry(host).or_insert(0) += 1;
    }
    let mut records_by_host: Vec<(String, u64)> = hosts.into_iter().collect();
    records_by_host.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let recent_runs = ledger.recent_runs(RECENT_RUN_LIMIT)?;

    Ok(LedgerStatistics {
        total_records,
        by_status_and_kind,
        records_by_host,
        artifact_bytes,
        recent_runs,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &LedgerStatistics) {
    println!("=== Ledger Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Hosts: {}", stats.records_by_host.len());
    println!("  Text artifact: {}", format_file_size(stats.artifact_bytes));
    println!();

    println!("Records by Status:");
    for status in ProcessStatus::all() {
        let total = stats.status_total(status);
        if total == 0 {
            continue;
        }
        println!(
            "  {}: {} ({:.1}%)",
            status,
            total,
            percentage(total, stats.total_records)
        );
        for kind in ContentKind::all() {
            let count = stats.count(status, kind);
            if count > 0 {
                println!("    {}: {}", kind, count);
            }
        }
    }
    println!();

    if !stats.records_by_host.is_empty() {
        println!("Records by Host:");
        for (host, count) in &stats.records_by_host {
            println!("  {}: {}", host, count);
        }
        println!();
    }

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            println!(
                "  #{} {} [{}] {} HTML, {} PDF (started {})",
                run.id,
                run.seed,
                run.outcome,
                run.html_processed,
                run.pdf_processed,
                run.started_at
            );
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} records with stored text)",
        stats.success_rate(),
        stats.status_total(ProcessStatus::Success),
        stats.total_records
    );
}
