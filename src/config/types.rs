use crate::url::ScopePolicy;
use serde::Deserialize;

/// Main configuration structure for Sumi-Scribe
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below so the crawler can run from the command line alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed URLs crawled in order when none are given on the command line
    pub seeds: Vec<String>,
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Global page ceiling, inclusive of records left by previous runs
    #[serde(rename = "max-pages")]
    pub max_pages: u64,

    /// Pause after every network request (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// How far the crawl may wander from the seed URL
    pub scope: ScopePolicy,

    /// Skip pages whose extracted text was already seen in this run
    #[serde(rename = "dedup-content")]
    pub dedup_content: bool,

    /// Consult robots.txt before fetching
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,

    /// Path suffixes that are never fetched (`.pdf` is always allowed)
    #[serde(rename = "ignored-extensions")]
    pub ignored_extensions: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 100,
            request_delay_ms: 1000,
            scope: ScopePolicy::default(),
            dedup_content: true,
            respect_robots: false,
            ignored_extensions: DEFAULT_IGNORED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// Binary and media resources that carry no extractable text
pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".webp", ".bmp", ".css", ".js", ".woff",
    ".woff2", ".ttf", ".eot", ".mp4", ".avi", ".mov", ".mp3", ".wav", ".ogg", ".webm", ".zip",
    ".tar", ".gz", ".rar", ".7z", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt",
    ".exe", ".dmg", ".iso",
];

/// HTTP fetching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// PDF documents larger than this are skipped
    #[serde(rename = "max-pdf-size-mb")]
    pub max_pdf_size_mb: u64,

    /// Maximum redirect hops followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_pdf_size_mb: 50,
            max_redirects: 10,
        }
    }
}

impl FetchConfig {
    /// PDF size ceiling in bytes
    pub fn max_pdf_bytes(&self) -> u64 {
        self.max_pdf_size_mb * 1024 * 1024
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiScribe".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/sumi-scribe/sumi-scribe".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite ledger of processed URLs
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,

    /// Path to the append-only text artifact
    #[serde(rename = "text-path")]
    pub text_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ledger_path: "data/crawled_urls.db".to_string(),
            text_path: "data/text_output.txt".to_string(),
        }
    }
}
