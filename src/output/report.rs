//! End-of-run summary printed by the CLI

use crate::crawler::CrawlReport;
use std::fmt::Write;

/// Formats a byte count as B, KB, MB or GB with two decimals
///
/// # Examples
///
/// ```
/// use sumi_scribe::output::format_file_size;
///
/// assert_eq!(format_file_size(512), "512.00 B");
/// assert_eq!(format_file_size(1536), "1.50 KB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}

/// Renders the summary of one invocation
///
/// # Arguments
///
/// * `reports` - One report per seed, in crawl order
/// * `artifact_bytes` - Size of the text artifact after the run
pub fn format_run_summary(reports: &[CrawlReport], artifact_bytes: u64) -> String {
    let mut out = String::new();

    let html: u64 = reports.iter().map(|r| r.html_processed).sum();
    let pdf: u64 = reports.iter().map(|r| r.pdf_processed).sum();
    let empty: u64 = reports.iter().map(|r| r.empty).sum();
    let errors: u64 = reports.iter().map(|r| r.errors).sum();
    let skipped: u64 = reports.iter().map(|r| r.skipped).sum();
    let ledger_hits: u64 = reports.iter().map(|r| r.ledger_hits).sum();

    let _ = writeln!(out, "=== Crawl Summary ===\n");
    let _ = writeln!(out, "Pages processed:");
    let _ = writeln!(out, "  HTML: {}", html);
    let _ = writeln!(out, "  PDF: {}", pdf);
    let _ = writeln!(out, "  Total: {}", html + pdf);
    let _ = writeln!(out, "  Empty: {}", empty);
    let _ = writeln!(out, "  Errors: {}", errors);
    let _ = writeln!(out, "  Skipped: {}", skipped);
    let _ = writeln!(out, "  Already in ledger: {}", ledger_hits);
    let _ = writeln!(out, "Text artifact size: {}", format_file_size(artifact_bytes));

    for report in reports {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} -> {} ({:.1}s)",
            report.seed,
            report.state,
            report.elapsed.as_secs_f64()
        );
        if report.duplicates > 0 {
            let _ = writeln!(out, "  Duplicate pages skipped: {}", report.duplicates);
        }
        if report.discarded > 0 {
            let _ = writeln!(out, "  Queued URLs discarded: {}", report.discarded);
        }

        if !report.depth_stats.is_empty() {
            let _ = writeln!(
                out,
                "  {:>5}  {:>9}  {:>9}  {:>12}",
                "depth", "attempted", "succeeded", "characters"
            );
            for (depth, stats) in &report.depth_stats {
                let _ = writeln!(
                    out,
                    "  {:>5}  {:>9}  {:>9}  {:>12}",
                    depth, stats.attempted, stats.succeeded, stats.characters
                );
            }
        }
    }

    out
}

/// Prints the summary of one invocation to stdout
pub fn print_run_summary(reports: &[CrawlReport], artifact_bytes: u64) {
    print!("{}", format_run_summary(reports, artifact_bytes));
}
