//! Crawl engine - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates one seed crawl:
//! - Managing the frontier queue and the per-run visited set
//! - Consulting the ledger so repeated invocations only fetch new URLs
//! - Dispatching each URL to the HTML or PDF path
//! - Recording every outcome and expanding the frontier
//! - Enforcing depth and page budgets and honoring cancellation

use crate::config::CrawlerConfig;
use crate::crawler::events::CrawlEvent;
use crate::crawler::fetcher::{ContentFetcher, FetchedPage, PageBody, PdfOutcome};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::report::CrawlReport;
use crate::robots::{AccessPolicy, AllowAll};
use crate::state::{ContentKind, CrawlState, ProcessStatus};
use crate::storage::{ProcessedLedger, TextSink};
use crate::url::{is_pdf_url, normalize_url, Scope, ScopePolicy};
use crate::{Result, ScribeError};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

/// Budgets and switches for a crawl, fixed for the engine's lifetime
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub max_depth: u32,

    /// Global ceiling on ledger records, including earlier runs
    pub max_pages: u64,

    /// Pause after every entry that touched the network
    pub request_delay: Duration,

    pub scope_policy: ScopePolicy,
    pub dedup_content: bool,
    pub ignored_extensions: Vec<String>,
}

impl CrawlSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            request_delay: Duration::from_millis(config.request_delay_ms),
            scope_policy: config.scope,
            dedup_content: config.dedup_content,
            ignored_extensions: config.ignored_extensions.clone(),
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Mutable state of one seed crawl
struct RunContext {
    scope: Scope,
    frontier: Frontier,
    visited: HashSet<String>,

    /// Content digest -> first URL with that content
    seen_content: HashMap<String, String>,

    /// Ledger size before this run started
    prior_records: u64,

    report: CrawlReport,
    started: Instant,
}

impl RunContext {
    fn budget_used(&self) -> u64 {
        self.prior_records + self.report.records_written
    }
}

/// Sequential scoped crawler
///
/// The engine owns its collaborators: a [`ContentFetcher`] for network
/// access, a [`ProcessedLedger`] remembering every URL across invocations,
/// a [`TextSink`] receiving extracted text and an [`AccessPolicy`].
///
/// # Example
///
/// ```no_run
/// use sumi_scribe::crawler::{CrawlEngine, CrawlSettings, HttpFetcher};
/// use sumi_scribe::config::{FetchConfig, UserAgentConfig};
/// use sumi_scribe::storage::{FileTextSink, SqliteLedger};
///
/// # async fn run() -> sumi_scribe::Result<()> {
/// let fetcher = HttpFetcher::from_config(&UserAgentConfig::default(), &FetchConfig::default())?;
/// let ledger = SqliteLedger::open(std::path::Path::new("data/crawled_urls.db"))?;
/// let sink = FileTextSink::new("data/text_output.txt");
///
/// let mut engine = CrawlEngine::new(fetcher, ledger, sink, CrawlSettings::default());
/// let report = engine.crawl("https://example.org/docs").await?;
/// println!("{} pages stored", report.total_processed());
/// # Ok(())
/// # }
/// ```
pub struct CrawlEngine<F, L, S> {
    fetcher: F,
    ledger: L,
    sink: S,
    settings: CrawlSettings,
    access: Box<dyn AccessPolicy>,
    events: Option<UnboundedSender<CrawlEvent>>,
    cancel: Arc<AtomicBool>,
    config_hash: String,
    state: CrawlState,
}

impl<F, L, S> CrawlEngine<F, L, S>
where
    F: ContentFetcher,
    L: ProcessedLedger,
    S: TextSink,
{
    /// Creates an idle engine that allows every URL in scope
    pub fn new(fetcher: F, ledger: L, sink: S, settings: CrawlSettings) -> Self {
        Self {
            fetcher,
            ledger,
            sink,
            settings,
            access: Box::new(AllowAll),
            events: None,
            cancel: Arc::new(AtomicBool::new(false)),
            config_hash: String::new(),
            state: CrawlState::Idle,
        }
    }

    /// Sends progress events to `sender`
    pub fn with_events(mut self, sender: UnboundedSender<CrawlEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Observes `flag` between URLs; setting it ends the run as `Cancelled`
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn with_access_policy(mut self, policy: Box<dyn AccessPolicy>) -> Self {
        self.access = policy;
        self
    }

    /// Hash of the configuration, stored with every run record
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Gives back the collaborators
    pub fn into_parts(self) -> (F, L, S) {
        (self.fetcher, self.ledger, self.sink)
    }

    fn transition(&mut self, next: CrawlState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(ScribeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("Engine state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn emit(&self, event: CrawlEvent) {
        if let Some(sender) = &self.events {
            // Nobody listening is fine
            let _ = sender.send(event);
        }
    }

    /// Crawls several seeds in order, pushing one report per seed
    ///
    /// All seeds share the ledger, the text artifact and the cumulative page
    /// budget. Stops after a run that ends `BudgetReached` or `Cancelled`.
    pub async fn crawl_seeds(
        &mut self,
        seeds: &[String],
        results: &mut Vec<CrawlReport>,
    ) -> Result<()> {
        for seed in seeds {
            let report = self.crawl(seed).await?;
            let state = report.state;
            results.push(report);

            if matches!(state, CrawlState::BudgetReached | CrawlState::Cancelled) {
                tracing::info!("Stopping after {} ({})", seed, state);
                break;
            }
        }
        Ok(())
    }

    /// Runs one seed crawl to exhaustion, budget or cancellation
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run ended in a terminal state; per-URL
    ///   failures are in the ledger, not here
    /// * `Err(ScribeError)` - Invalid start URL or a ledger failure
    pub async fn crawl(&mut self, start_url: &str) -> Result<CrawlReport> {
        let scope = Scope::new(start_url, self.settings.scope_policy)?
            .with_ignored_extensions(&self.settings.ignored_extensions);
        let seed = scope.root().to_string();
        let prior_records = self.ledger.count()?;

        self.transition(CrawlState::Running)?;

        let run_id = match self.ledger.begin_run(&seed, &self.config_hash) {
            Ok(id) => id,
            Err(e) => {
                self.state = CrawlState::Idle;
                return Err(e.into());
            }
        };

        let remaining = self.settings.max_pages.saturating_sub(prior_records);
        tracing::info!(
            "Starting crawl of {} (scope {}, max depth {}, {} of {} pages left)",
            seed,
            self.settings.scope_policy,
            self.settings.max_depth,
            remaining,
            self.settings.max_pages
        );
        self.emit(CrawlEvent::Started {
            seed: seed.clone(),
            remaining_budget: remaining,
        });

        let mut frontier = Frontier::new(self.settings.max_depth);
        frontier.push(seed.clone(), 0);

        let mut run = RunContext {
            scope,
            frontier,
            visited: HashSet::new(),
            seen_content: HashMap::new(),
            prior_records,
            report: CrawlReport::new(seed.clone()),
            started: Instant::now(),
        };

        let terminal = match self.drive(&mut run).await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("Crawl of {} aborted: {}", seed, e);
                self.state = CrawlState::Idle;
                return Err(e);
            }
        };

        self.transition(terminal)?;
        run.report.state = terminal;
        run.report.elapsed = run.started.elapsed();

        let finished = self.ledger.finish_run(
            run_id,
            terminal,
            run.report.html_processed,
            run.report.pdf_processed,
        );
        self.transition(CrawlState::Idle)?;
        finished?;

        tracing::info!(
            "Crawl of {} finished ({}): {} HTML, {} PDF, {} records in {:?}",
            seed,
            terminal,
            run.report.html_processed,
            run.report.pdf_processed,
            run.report.records_written,
            run.report.elapsed
        );
        self.emit(CrawlEvent::Finished {
            seed,
            state: terminal,
            html_processed: run.report.html_processed,
            pdf_processed: run.report.pdf_processed,
        });

        Ok(run.report)
    }

    /// The main loop; returns the terminal state
    async fn drive(&mut self, run: &mut RunContext) -> Result<CrawlState> {
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::info!(
                    "Cancellation requested, {} URLs left in frontier",
                    run.frontier.len()
                );
                return Ok(CrawlState::Cancelled);
            }

            if run.budget_used() >= self.settings.max_pages && !run.frontier.is_empty() {
                run.report.discarded = run.frontier.clear() as u64;
                tracing::info!(
                    "Page budget of {} reached, discarding {} queued URLs",
                    self.settings.max_pages,
                    run.report.discarded
                );
                return Ok(CrawlState::BudgetReached);
            }

            let Some(entry) = run.frontier.pop() else {
                tracing::info!("Frontier is empty, crawl complete");
                return Ok(CrawlState::Exhausted);
            };

            let touched_network = self.process_entry(run, entry).await?;

            if touched_network && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }
        }
    }

    /// Handles one dequeued entry
    ///
    /// # Returns
    ///
    /// Whether a fetch was made for this entry
    async fn process_entry(&mut self, run: &mut RunContext, entry: FrontierEntry) -> Result<bool> {
        let url = normalize_url(&entry.url);
        let depth = entry.depth;

        if depth > self.settings.max_depth {
            tracing::debug!("Dropping {}: depth {} over limit", url, depth);
            return Ok(false);
        }

        if run.visited.contains(&url) {
            return Ok(false);
        }

        if self.ledger.is_processed(&url)? {
            tracing::debug!("Already in ledger: {}", url);
            run.visited.insert(url);
            run.report.ledger_hits += 1;
            return Ok(false);
        }

        if !run.scope.contains(&url) {
            tracing::debug!("Out of scope: {}", url);
            return Ok(false);
        }

        let pdf_url = Url::parse(&url).map(|parsed| is_pdf_url(&parsed)).unwrap_or(false);

        if !self.access.is_allowed(&url).await {
            tracing::info!("URL {} disallowed by robots.txt", url);
            run.visited.insert(url.clone());
            let kind = if pdf_url {
                ContentKind::Pdf
            } else {
                ContentKind::Html
            };
            self.record(
                run,
                &url,
                depth,
                ProcessStatus::Skipped,
                kind,
                Some("disallowed by robots.txt"),
                0,
            )?;
            return Ok(false);
        }

        run.visited.insert(url.clone());
        run.report.depth_mut(depth).attempted += 1;
        tracing::debug!("Processing {} at depth {}", url, depth);

        let links = if pdf_url {
            self.pdf_path(run, &url, depth).await?
        } else {
            self.html_path(run, &url, depth).await?
        };

        self.enqueue_links(run, &links, depth)?;
        Ok(true)
    }

    /// Fetches a URL without a PDF extension
    ///
    /// Returns the links discovered on the page.
    async fn html_path(
        &mut self,
        run: &mut RunContext,
        url: &str,
        depth: u32,
    ) -> Result<Vec<String>> {
        let page = match self.fetcher.fetch_html(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                let message = e.to_string();
                self.record(run, url, depth, ProcessStatus::Error, ContentKind::Html, Some(&message), 0)?;
                return Ok(Vec::new());
            }
        };

        self.handle_page(run, url, depth, page).await
    }

    /// Fetches a URL with a PDF extension
    async fn pdf_path(
        &mut self,
        run: &mut RunContext,
        url: &str,
        depth: u32,
    ) -> Result<Vec<String>> {
        match self.fetcher.fetch_and_extract_pdf(url).await {
            Ok(PdfOutcome::NotPdf(page)) => {
                tracing::debug!("{} is served as {}", url, page.content_type);
                self.handle_page(run, url, depth, page).await
            }
            Ok(outcome) => {
                self.handle_pdf_outcome(run, url, depth, outcome)?;
                Ok(Vec::new())
            }
            Err(e) => {
                tracing::warn!("Failed to process PDF {}: {}", url, e);
                let message = e.to_string();
                self.record(run, url, depth, ProcessStatus::Error, ContentKind::Pdf, Some(&message), 0)?;
                Ok(Vec::new())
            }
        }
    }

    /// Processes a response by the content type the server declared
    async fn handle_page(
        &mut self,
        run: &mut RunContext,
        url: &str,
        depth: u32,
        page: FetchedPage,
    ) -> Result<Vec<String>> {
        match page.body {
            PageBody::Html(body) => {
                let extracted = self.fetcher.extract_text_and_links(&body, &page.final_url);

                if extracted.text.trim().is_empty() {
                    tracing::debug!("No text on {}", url);
                    self.record(run, url, depth, ProcessStatus::Empty, ContentKind::Html, None, 0)?;
                } else {
                    self.store_text(run, url, depth, &extracted.text, ContentKind::Html)?;
                }
                Ok(extracted.links)
            }
            PageBody::Pdf(bytes) => {
                let outcome = match self.fetcher.extract_pdf(bytes).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::warn!("Failed to process PDF {}: {}", url, e);
                        let message = e.to_string();
                        self.record(run, url, depth, ProcessStatus::Error, ContentKind::Pdf, Some(&message), 0)?;
                        return Ok(Vec::new());
                    }
                };
                self.handle_pdf_outcome(run, url, depth, outcome)?;
                Ok(Vec::new())
            }
            PageBody::OversizePdf { bytes } => {
                self.handle_pdf_outcome(run, url, depth, PdfOutcome::Oversize { bytes })?;
                Ok(Vec::new())
            }
            PageBody::Unread => {
                let message = format!("unsupported content type: {}", page.content_type);
                tracing::debug!("Skipping {}: {}", url, message);
                self.record(run, url, depth, ProcessStatus::Skipped, ContentKind::Other, Some(&message), 0)?;
                Ok(Vec::new())
            }
        }
    }

    /// Records the outcome of a PDF download; PDFs contribute no links
    fn handle_pdf_outcome(
        &mut self,
        run: &mut RunContext,
        url: &str,
        depth: u32,
        outcome: PdfOutcome,
    ) -> Result<()> {
        match outcome {
            PdfOutcome::Text(text) => self.store_text(run, url, depth, &text, ContentKind::Pdf),
            PdfOutcome::NoText => {
                tracing::debug!("No text in PDF {}", url);
                self.record(run, url, depth, ProcessStatus::Empty, ContentKind::Pdf, None, 0)
            }
            PdfOutcome::Oversize { bytes } => {
                let message = format!("PDF too large: {} bytes", bytes);
                tracing::warn!("Skipping {}: {}", url, message);
                self.record(run, url, depth, ProcessStatus::Skipped, ContentKind::Pdf, Some(&message), 0)
            }
            PdfOutcome::NotPdf(page) => {
                let message = format!("unsupported content type: {}", page.content_type);
                tracing::debug!("Skipping {}: {}", url, message);
                self.record(run, url, depth, ProcessStatus::Skipped, ContentKind::Other, Some(&message), 0)
            }
        }
    }

    /// Appends text to the sink and records the outcome
    fn store_text(
        &mut self,
        run: &mut RunContext,
        url: &str,
        depth: u32,
        text: &str,
        kind: ContentKind,
    ) -> Result<()> {
        let digest = self.settings.dedup_content.then(|| content_digest(text));

        if let Some(first) = digest.as_ref().and_then(|d| run.seen_content.get(d)) {
            let message = format!("duplicate content of {}", first);
            tracing::debug!("Skipping {}: {}", url, message);
            run.report.duplicates += 1;
            self.record(run, url, depth, ProcessStatus::Skipped, kind, Some(&message), 0)?;
            return Ok(());
        }

        let size_before = self.sink.size_bytes();
        match self.sink.append(url, text, kind) {
            Ok(true) => {
                let bytes = self.sink.size_bytes().saturating_sub(size_before);
                if let Some(digest) = digest {
                    run.seen_content.insert(digest, url.to_string());
                }

                match kind {
                    ContentKind::Pdf => run.report.pdf_processed += 1,
                    _ => run.report.html_processed += 1,
                }
                run.report.bytes_appended += bytes;
                let stats = run.report.depth_mut(depth);
                stats.succeeded += 1;
                stats.characters += text.chars().count() as u64;

                self.record(run, url, depth, ProcessStatus::Success, kind, None, bytes)
            }
            Ok(false) => self.record(run, url, depth, ProcessStatus::Empty, kind, None, 0),
            Err(e) => {
                tracing::warn!("Failed to store text for {}: {}", url, e);
                let message = e.to_string();
                self.record(run, url, depth, ProcessStatus::Error, kind, Some(&message), 0)
            }
        }
    }

    /// Writes one ledger record, counts it and reports progress
    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        run: &mut RunContext,
        url: &str,
        depth: u32,
        status: ProcessStatus,
        kind: ContentKind,
        error: Option<&str>,
        bytes: u64,
    ) -> Result<()> {
        self.ledger.mark_processed(url, status, kind, error)?;
        run.report.count_record(status);

        let count = run.report.records_written;
        self.emit(CrawlEvent::Processed {
            count,
            depth,
            url: url.to_string(),
            status,
            content_type: kind,
            bytes,
        });

        if count % 10 == 0 {
            let elapsed = run.started.elapsed();
            let rate = count as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress: {} pages recorded, {} in frontier, {:.2} pages/sec",
                count,
                run.frontier.len(),
                rate
            );
        }

        Ok(())
    }

    /// Queues in-scope links not yet seen at `depth + 1`
    fn enqueue_links(&mut self, run: &mut RunContext, links: &[String], depth: u32) -> Result<()> {
        let next_depth = depth + 1;
        if next_depth > self.settings.max_depth {
            return Ok(());
        }

        let mut queued = 0;
        for link in links {
            let normalized = normalize_url(link);

            if run.visited.contains(&normalized)
                || run.frontier.contains(&normalized)
                || !run.scope.contains(&normalized)
            {
                continue;
            }

            if self.ledger.is_processed(&normalized)? {
                continue;
            }

            if run.frontier.push(normalized, next_depth) {
                queued += 1;
            }
        }

        if queued > 0 {
            tracing::debug!("Queued {} new URLs at depth {}", queued, next_depth);
        }
        Ok(())
    }
}

/// SHA-256 hex digest of extracted text
pub fn content_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.trim().as_bytes());
    hex::encode(hasher.finalize())
}
