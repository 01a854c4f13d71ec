//! End-to-end crawl tests
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::path::Path;
use std::time::Duration;
use sumi_scribe::config::{FetchConfig, UserAgentConfig};
use sumi_scribe::crawler::{CrawlEngine, CrawlSettings, HttpFetcher};
use sumi_scribe::robots::RobotsPolicy;
use sumi_scribe::storage::{
    open_ledger, reset_outputs, FileTextSink, ProcessedLedger, SqliteLedger,
};
use sumi_scribe::{ContentKind, CrawlState, ProcessStatus, ScopePolicy};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Engine = CrawlEngine<HttpFetcher, SqliteLedger, FileTextSink>;

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    }
}

fn test_settings(max_depth: u32, max_pages: u64) -> CrawlSettings {
    CrawlSettings {
        max_depth,
        max_pages,
        request_delay: Duration::ZERO,
        scope_policy: ScopePolicy::DomainAndPathPrefix,
        ..CrawlSettings::default()
    }
}

/// Creates an engine writing into `dir`
fn create_engine(dir: &Path, settings: CrawlSettings, max_pdf_bytes: u64) -> Engine {
    let fetch = FetchConfig {
        timeout_secs: 5,
        ..FetchConfig::default()
    };
    let client = sumi_scribe::crawler::build_http_client(&test_user_agent(), &fetch)
        .expect("Failed to build client");
    let fetcher = HttpFetcher::new(client, max_pdf_bytes);
    let ledger = open_ledger(&dir.join("ledger.db")).expect("Failed to open ledger");
    let sink = FileTextSink::new(dir.join("text.txt"));

    CrawlEngine::new(fetcher, ledger, sink, settings)
}

fn html_page(text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">link</a></li>"#, href))
        .collect();
    format!(
        "<html><head><title>Test</title></head><body><nav><ul>{}</ul></nav><main><p>{}</p></main></body></html>",
        anchors, text
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

/// Mounts `/docs` linking to `/docs/a`, `/docs/b` and the out-of-scope `/external.com/x`
async fn mount_docs_site(server: &MockServer) {
    mount_html(
        server,
        "/docs",
        html_page(
            &"Documentation ".repeat(14),
            &["/docs/a", "/docs/b", "/external.com/x"],
        ),
    )
    .await;
    mount_html(server, "/docs/a", html_page(&"Alpha text. ".repeat(4), &[])).await;
    mount_html(server, "/docs/b", html_page(&"Beta text. ".repeat(5), &[])).await;
    mount_html(server, "/external.com/x", html_page("Outside", &[])).await;
}

#[tokio::test]
async fn test_full_crawl_docs_section() {
    let mock_server = MockServer::start().await;
    mount_docs_site(&mock_server).await;
    let seed = format!("{}/docs", mock_server.uri());

    let dir = TempDir::new().unwrap();
    let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024 * 1024);
    let report = engine.crawl(&seed).await.expect("Crawl failed");

    assert_eq!(report.state, CrawlState::Exhausted);
    assert_eq!(report.html_processed, 3);

    let ledger = engine.ledger();
    assert_eq!(ledger.count().unwrap(), 3);
    assert_eq!(
        ledger
            .count_by_status_and_type(ProcessStatus::Success, ContentKind::Html)
            .unwrap(),
        3
    );
    assert!(!ledger
        .is_processed(&format!("{}/external.com/x", mock_server.uri()))
        .unwrap());
    assert_eq!(engine.sink().entry_count(), 3);

    let content = std::fs::read_to_string(dir.path().join("text.txt")).unwrap();
    assert!(content.contains(&format!("URL: {}\n", seed)));
    assert!(content.contains("Alpha text."));
    assert!(!content.contains("Outside"));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|request| request.url.path() != "/external.com/x"));
}

#[tokio::test]
async fn test_page_budget_of_one() {
    let mock_server = MockServer::start().await;
    mount_docs_site(&mock_server).await;
    let seed = format!("{}/docs", mock_server.uri());

    let dir = TempDir::new().unwrap();
    let mut engine = create_engine(dir.path(), test_settings(1, 1), 1024 * 1024);
    let report = engine.crawl(&seed).await.unwrap();

    assert_eq!(report.state, CrawlState::BudgetReached);
    assert_eq!(engine.ledger().count().unwrap(), 1);
    assert_eq!(engine.sink().entry_count(), 1);
}

#[tokio::test]
async fn test_rerun_is_incremental_across_processes() {
    let mock_server = MockServer::start().await;
    mount_docs_site(&mock_server).await;
    let seed = format!("{}/docs", mock_server.uri());
    let dir = TempDir::new().unwrap();

    {
        let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024 * 1024);
        engine.crawl(&seed).await.unwrap();
    }
    let size_after_first = std::fs::metadata(dir.path().join("text.txt")).unwrap().len();

    let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024 * 1024);
    let report = engine.crawl(&seed).await.unwrap();

    assert_eq!(report.records_written, 0);
    assert_eq!(report.ledger_hits, 1);
    assert_eq!(engine.ledger().count().unwrap(), 3);
    assert_eq!(
        std::fs::metadata(dir.path().join("text.txt")).unwrap().len(),
        size_after_first
    );

    let runs = engine.ledger().recent_runs(10).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|run| run.outcome == CrawlState::Exhausted));
}

#[tokio::test]
async fn test_reset_allows_full_recrawl() {
    let mock_server = MockServer::start().await;
    mount_docs_site(&mock_server).await;
    let seed = format!("{}/docs", mock_server.uri());
    let dir = TempDir::new().unwrap();

    {
        let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024 * 1024);
        engine.crawl(&seed).await.unwrap();
    }

    reset_outputs(&dir.path().join("ledger.db"), &dir.path().join("text.txt")).unwrap();

    let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024 * 1024);
    let report = engine.crawl(&seed).await.unwrap();
    assert_eq!(report.html_processed, 3);
    assert_eq!(engine.sink().entry_count(), 3);
}

#[tokio::test]
async fn test_server_errors_are_recorded() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        "/docs",
        html_page("Index page", &["/docs/broken", "/docs/ok"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/docs/ok", html_page("Still crawled", &[])).await;

    let dir = TempDir::new().unwrap();
    let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024 * 1024);
    let report = engine
        .crawl(&format!("{}/docs", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.state, CrawlState::Exhausted);
    assert_eq!(report.errors, 1);
    assert_eq!(report.html_processed, 2);

    let record = engine
        .ledger()
        .get_record(&format!("{}/docs/broken", mock_server.uri()))
        .unwrap()
        .expect("Missing error record");
    assert_eq!(record.status, ProcessStatus::Error);
    assert_eq!(record.error.as_deref(), Some("HTTP 500"));
}

#[tokio::test]
async fn test_pdf_paths() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        "/docs",
        html_page(
            "Reports",
            &["/docs/big.pdf", "/docs/broken.pdf", "/docs/logo"],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/big.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 8192], "application/pdf"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/broken.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-garbage".to_vec(), "application/pdf"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/logo"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8; 16], "image/png"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut engine = create_engine(dir.path(), test_settings(1, 10), 4096);
    engine
        .crawl(&format!("{}/docs", mock_server.uri()))
        .await
        .unwrap();

    let ledger = engine.ledger();
    let base = mock_server.uri();

    let big = ledger
        .get_record(&format!("{}/docs/big.pdf", base))
        .unwrap()
        .unwrap();
    assert_eq!(big.status, ProcessStatus::Skipped);
    assert_eq!(big.content_kind, ContentKind::Pdf);

    let broken = ledger
        .get_record(&format!("{}/docs/broken.pdf", base))
        .unwrap()
        .unwrap();
    assert_eq!(broken.status, ProcessStatus::Error);
    assert_eq!(broken.content_kind, ContentKind::Pdf);

    let logo = ledger
        .get_record(&format!("{}/docs/logo", base))
        .unwrap()
        .unwrap();
    assert_eq!(logo.status, ProcessStatus::Skipped);
    assert_eq!(logo.content_kind, ContentKind::Other);

    assert_eq!(engine.sink().entry_count(), 1);
}

#[tokio::test]
async fn test_ignored_extensions_never_requested() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        "/docs",
        html_page("Gallery", &["/docs/photo.JPG", "/docs/style.css"]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024);
    engine
        .crawl(&format!("{}/docs", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(engine.ledger().count().unwrap(), 1);
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /docs/private"),
        )
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/docs",
        html_page("Index", &["/docs/public", "/docs/private"]),
    )
    .await;
    mount_html(&mock_server, "/docs/public", html_page("Public", &[])).await;
    mount_html(&mock_server, "/docs/private", html_page("Private", &[])).await;

    let dir = TempDir::new().unwrap();
    let client = sumi_scribe::crawler::build_http_client(&test_user_agent(), &FetchConfig::default())
        .unwrap();
    let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024)
        .with_access_policy(Box::new(RobotsPolicy::new(client, "TestBot")));

    engine
        .crawl(&format!("{}/docs", mock_server.uri()))
        .await
        .unwrap();

    let record = engine
        .ledger()
        .get_record(&format!("{}/docs/private", mock_server.uri()))
        .unwrap()
        .expect("Disallowed URL should be recorded");
    assert_eq!(record.status, ProcessStatus::Skipped);
    assert_eq!(record.error.as_deref(), Some("disallowed by robots.txt"));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|request| request.url.path() != "/docs/private"));
    assert_eq!(engine.sink().entry_count(), 2);
}

#[tokio::test]
async fn test_domain_only_scope_follows_whole_host() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        "/docs",
        html_page("Docs home", &["/blog/post"]),
    )
    .await;
    mount_html(&mock_server, "/blog/post", html_page("Blog post", &[])).await;

    let dir = TempDir::new().unwrap();
    let settings = CrawlSettings {
        scope_policy: ScopePolicy::DomainOnly,
        ..test_settings(1, 10)
    };
    let mut engine = create_engine(dir.path(), settings, 1024);
    let report = engine
        .crawl(&format!("{}/docs", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.html_processed, 2);
}

#[tokio::test]
async fn test_crawl_seeds_collects_reports() {
    let mock_server = MockServer::start().await;
    mount_docs_site(&mock_server).await;
    mount_html(&mock_server, "/guide", html_page("Guide", &[])).await;

    let dir = TempDir::new().unwrap();
    let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024);
    let seeds = vec![
        format!("{}/docs", mock_server.uri()),
        format!("{}/guide", mock_server.uri()),
    ];

    let mut reports = Vec::new();
    engine.crawl_seeds(&seeds, &mut reports).await.unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].html_processed, 3);
    assert_eq!(reports[1].html_processed, 1);
    assert_eq!(engine.ledger().count().unwrap(), 4);
    assert_eq!(engine.sink().entry_count(), 4);
}

#[tokio::test]
async fn test_mismatched_content_types_use_one_request() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        "/docs",
        html_page("Downloads", &["/docs/report", "/docs/guide.pdf"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/report"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-garbage".to_vec(), "application/pdf"),
        )
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/docs/guide.pdf",
        html_page("The guide is a web page", &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut engine = create_engine(dir.path(), test_settings(1, 10), 1024 * 1024);
    engine
        .crawl(&format!("{}/docs", mock_server.uri()))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    for route in ["/docs/report", "/docs/guide.pdf"] {
        let hits = requests
            .iter()
            .filter(|request| request.url.path() == route)
            .count();
        assert_eq!(hits, 1, "requests to {}", route);
    }

    let base = mock_server.uri();
    let report = engine
        .ledger()
        .get_record(&format!("{}/docs/report", base))
        .unwrap()
        .unwrap();
    assert_eq!(report.status, ProcessStatus::Error);
    assert_eq!(report.content_kind, ContentKind::Pdf);

    let guide = engine
        .ledger()
        .get_record(&format!("{}/docs/guide.pdf", base))
        .unwrap()
        .unwrap();
    assert_eq!(guide.status, ProcessStatus::Success);
    assert_eq!(guide.content_kind, ContentKind::Html);
}
