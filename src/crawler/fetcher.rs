//! HTTP fetcher implementation
//!
//! This module handles all network access for the crawler, including:
//! - Building HTTP clients with a descriptive user agent string
//! - GET requests for HTML pages
//! - Size-capped PDF downloads and text extraction
//! - Error classification

use crate::config::{FetchConfig, UserAgentConfig};
use crate::crawler::parser::{extract_page, ExtractedPage};
use crate::crawler::pdf::extract_pdf_text;
use crate::state::ContentKind;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, Response};
use std::time::Duration;
use thiserror::Error;

/// Why a resource could not be retrieved
///
/// Every variant is recorded as an `error` ledger entry; none of them stops
/// the crawl.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {code}")]
    Status { code: u16 },

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Network(format!("Connection failed: {}", e))
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// A successfully retrieved resource, whatever its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Body as read for the declared content type
    pub body: PageBody,

    /// `Content-Type` header value (empty if absent)
    pub content_type: String,

    /// Final URL after redirects
    pub final_url: String,
}

/// What was kept of a response body
///
/// The body is read once, according to the declared content type, so a
/// resource is never requested twice when its type differs from what its
/// URL suggests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBody {
    /// Decoded text of an HTML response
    Html(String),

    /// Raw bytes of a PDF response within the size ceiling
    Pdf(Vec<u8>),

    /// A PDF whose declared or observed size exceeds the ceiling
    OversizePdf { bytes: u64 },

    /// Neither HTML nor PDF; the body was not read
    Unread,
}

/// Result of asking for a PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfOutcome {
    /// Extracted, whitespace-normalized text
    Text(String),

    /// The document parsed but contains no text (e.g. scanned pages)
    NoText,

    /// The server declared a different content type; the response is kept
    NotPdf(FetchedPage),

    /// Declared or observed size exceeds the ceiling
    Oversize { bytes: u64 },
}

/// Retrieves resources for the crawl engine
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetches a page, following redirects
    ///
    /// PDF responses come back as [`PageBody::Pdf`] so the caller can extract
    /// them without another request.
    async fn fetch_html(&self, url: &str) -> Result<FetchedPage, FetchError>;

    /// Extracts text and links from a fetched HTML body
    fn extract_text_and_links(&self, raw: &str, url: &str) -> ExtractedPage {
        extract_page(raw, url)
    }

    /// Downloads a PDF and extracts its text
    ///
    /// Any other content type yields [`PdfOutcome::NotPdf`] carrying the
    /// response that was already read.
    async fn fetch_and_extract_pdf(&self, url: &str) -> Result<PdfOutcome, FetchError>;

    /// Extracts text from downloaded PDF bytes
    async fn extract_pdf(&self, bytes: Vec<u8>) -> Result<PdfOutcome, FetchError> {
        let text = extract_pdf_text(bytes).await?;
        if text.is_empty() {
            Ok(PdfOutcome::NoText)
        } else {
            Ok(PdfOutcome::Text(text))
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Identification sent with every request
/// * `fetch` - Timeout and redirect limits
///
/// # Example
///
/// ```no_run
/// use sumi_scribe::config::{FetchConfig, UserAgentConfig};
/// use sumi_scribe::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(fetch.timeout_secs.min(10)))
        .redirect(Policy::limited(fetch.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`ContentFetcher`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_pdf_bytes: u64,
}

impl HttpFetcher {
    pub fn new(client: Client, max_pdf_bytes: u64) -> Self {
        Self {
            client,
            max_pdf_bytes,
        }
    }

    /// Builds the client and size ceiling from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        fetch: &FetchConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(user_agent, fetch)?,
            fetch.max_pdf_bytes(),
        ))
    }

    /// The underlying client, shared with robots.txt fetching
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Issues the single GET for `url` and reads the body by content type
    async fn read_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.get(url).await?;
        let final_url = response.url().to_string();
        let content_type = content_type_of(&response);

        let body = match ContentKind::from_content_type(&content_type) {
            ContentKind::Html => PageBody::Html(
                response
                    .text()
                    .await
                    .map_err(|e| FetchError::Body(e.to_string()))?,
            ),
            ContentKind::Pdf => self.read_pdf_body(response).await?,
            // Binary bodies are not worth decoding; the engine only needs the type
            ContentKind::Other => PageBody::Unread,
        };

        Ok(FetchedPage {
            body,
            content_type,
            final_url,
        })
    }

    /// Reads a PDF body, stopping as soon as the ceiling is exceeded
    async fn read_pdf_body(&self, mut response: Response) -> Result<PageBody, FetchError> {
        if let Some(declared) = response.content_length() {
            if declared > self.max_pdf_bytes {
                return Ok(PageBody::OversizePdf { bytes: declared });
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > self.max_pdf_bytes {
                return Ok(PageBody::OversizePdf {
                    bytes: bytes.len() as u64,
                });
            }
        }

        tracing::debug!("Downloaded {} bytes of PDF from {}", bytes.len(), response.url());
        Ok(PageBody::Pdf(bytes))
    }
}

fn content_type_of(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.read_page(url).await
    }

    async fn fetch_and_extract_pdf(&self, url: &str) -> Result<PdfOutcome, FetchError> {
        let page = self.read_page(url).await?;

        match page.body {
            PageBody::Pdf(bytes) => self.extract_pdf(bytes).await,
            PageBody::OversizePdf { bytes } => Ok(PdfOutcome::Oversize { bytes }),
            body => Ok(PdfOutcome::NotPdf(FetchedPage { body, ..page })),
        }
    }
}
