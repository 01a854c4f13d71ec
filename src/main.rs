//! Sumi-Scribe main entry point
//!
//! This is the command-line interface for the Sumi-Scribe text harvester.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use sumi_scribe::config::{hash_config_content, load_config_with_hash, validate, Config};
use sumi_scribe::crawler::{CrawlEngine, CrawlEvent, CrawlSettings, HttpFetcher};
use sumi_scribe::output::{load_statistics, print_run_summary, print_statistics};
use sumi_scribe::robots::RobotsPolicy;
use sumi_scribe::storage::{open_ledger, reset_outputs, FileTextSink, TextSink};
use sumi_scribe::url::ScopePolicy;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

/// Sumi-Scribe: a scoped text harvester
///
/// Sumi-Scribe crawls one site (or one section of it) breadth-first,
/// extracts text from HTML pages and PDF documents and appends it to a text
/// file for retrieval indexing. A ledger of processed URLs makes repeated
/// runs incremental.
#[derive(Parser, Debug)]
#[command(name = "sumi-scribe")]
#[command(version)]
#[command(about = "A scoped text harvester for retrieval indexing", long_about = None)]
struct Cli {
    /// Seed URLs, crawled in order (defaults to `seeds` from the config file)
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum link depth from each seed [default: 3]
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Global page ceiling, counting pages from earlier runs [default: 100]
    #[arg(long, value_name = "N")]
    max_pages: Option<u64>,

    /// How far the crawl may wander from each seed [default: domain-path]
    #[arg(long, value_enum)]
    scope: Option<ScopePolicy>,

    /// Pause after every request, in milliseconds [default: 1000]
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Consult robots.txt before fetching
    #[arg(long)]
    respect_robots: bool,

    /// Keep pages whose text duplicates an earlier page
    #[arg(long)]
    no_dedup: bool,

    /// Delete the ledger and text artifact before crawling
    #[arg(long)]
    reset: bool,

    /// Show statistics from the ledger and exit
    #[arg(long, conflicts_with = "reset")]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = load_configuration(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    if cli.stats {
        return handle_stats(&config);
    }

    if cli.reset {
        handle_reset(&config)?;
    }

    handle_crawl(config, config_hash, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scribe=info,warn"),
            1 => EnvFilter::new("sumi_scribe=debug,info"),
            2 => EnvFilter::new("sumi_scribe=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given, defaults otherwise
fn load_configuration(path: Option<&Path>) -> anyhow::Result<(Config, String)> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok((config, hash))
        }
        None => Ok((Config::default(), hash_config_content(""))),
    }
}

/// Command-line flags take precedence over the config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if !cli.urls.is_empty() {
        config.seeds = cli.urls.clone();
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(scope) = cli.scope {
        config.crawler.scope = scope;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.crawler.request_delay_ms = delay_ms;
    }
    if cli.respect_robots {
        config.crawler.respect_robots = true;
    }
    if cli.no_dedup {
        config.crawler.dedup_content = false;
    }
}

/// Handles the --stats mode: shows statistics from the ledger
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Ledger: {}", config.output.ledger_path);
    println!("Text artifact: {}\n", config.output.text_path);

    let ledger = open_ledger(Path::new(&config.output.ledger_path))
        .with_context(|| format!("Failed to open ledger {}", config.output.ledger_path))?;
    let artifact_bytes = FileTextSink::new(&config.output.text_path).size_bytes();

    let stats = load_statistics(&ledger, artifact_bytes).context("Failed to read ledger")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles --reset: removes the ledger and the text artifact
fn handle_reset(config: &Config) -> anyhow::Result<()> {
    let removed = reset_outputs(
        Path::new(&config.output.ledger_path),
        Path::new(&config.output.text_path),
    )
    .context("Failed to reset outputs")?;

    if removed.is_empty() {
        tracing::info!("Nothing to reset");
    }
    for path in removed {
        tracing::info!("Removed {}", path.display());
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String, quiet: bool) -> anyhow::Result<()> {
    if config.seeds.is_empty() {
        bail!("No seed URL given; pass one on the command line or set `seeds` in the config file");
    }

    tracing::info!(
        "Seeds: {}, max depth: {}, max pages: {}, scope: {}",
        config.seeds.len(),
        config.crawler.max_depth,
        config.crawler.max_pages,
        config.crawler.scope
    );

    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.fetch)
        .context("Failed to build HTTP client")?;
    let ledger = open_ledger(Path::new(&config.output.ledger_path))
        .with_context(|| format!("Failed to open ledger {}", config.output.ledger_path))?;
    let sink = FileTextSink::new(&config.output.text_path);

    let robots = config.crawler.respect_robots.then(|| {
        RobotsPolicy::new(
            fetcher.client().clone(),
            config.user_agent.crawler_name.clone(),
        )
    });

    let cancel = Arc::new(AtomicBool::new(false));
    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();

    let mut engine = CrawlEngine::new(
        fetcher,
        ledger,
        sink,
        CrawlSettings::from_config(&config.crawler),
    )
    .with_events(events_tx)
    .with_cancel_flag(Arc::clone(&cancel))
    .with_config_hash(config_hash);

    if let Some(policy) = robots {
        tracing::info!("Respecting robots.txt as {}", config.user_agent.crawler_name);
        engine = engine.with_access_policy(Box::new(policy));
    }

    // Ctrl-C finishes the current URL, then the run ends as cancelled
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current URL");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let progress = tokio::spawn(report_progress(events_rx, quiet));

    let mut reports = Vec::new();
    let result = engine.crawl_seeds(&config.seeds, &mut reports).await;
    let artifact_bytes = engine.sink().size_bytes();

    // Dropping the engine closes the event channel
    drop(engine);
    if let Err(e) = progress.await {
        tracing::debug!("Progress task ended abnormally: {}", e);
    }

    if !quiet {
        println!();
        print_run_summary(&reports, artifact_bytes);
    }

    result.context("Crawl failed")?;
    Ok(())
}

/// Prints one line per recorded URL
async fn report_progress(mut events: UnboundedReceiver<CrawlEvent>, quiet: bool) {
    while let Some(event) = events.recv().await {
        if quiet {
            continue;
        }
        match event {
            CrawlEvent::Started {
                seed,
                remaining_budget,
            } => {
                println!("Crawling {} ({} pages left in budget)", seed, remaining_budget);
            }
            CrawlEvent::Processed {
                count,
                depth,
                url,
                status,
                content_type,
                bytes,
            } => {
                println!(
                    "[{:>4}] depth {} {:<7} {:<5} {} ({} bytes)",
                    count,
                    depth,
                    status.to_db_string(),
                    content_type.to_db_string(),
                    url,
                    bytes
                );
            }
            CrawlEvent::Finished {
                seed,
                state,
                html_processed,
                pdf_processed,
            } => {
                println!(
                    "Finished {}: {} ({} HTML, {} PDF)",
                    seed, state, html_processed, pdf_processed
                );
            }
        }
    }
}
