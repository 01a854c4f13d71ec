//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and PDF download
//! - HTML text and link extraction
//! - The breadth-first frontier
//! - The crawl engine and its progress events

mod engine;
mod events;
mod fetcher;
mod frontier;
mod parser;
mod pdf;
mod report;

pub use engine::{content_digest, CrawlEngine, CrawlSettings};
pub use events::CrawlEvent;
pub use fetcher::{
    build_http_client, ContentFetcher, FetchError, FetchedPage, HttpFetcher, PageBody, PdfOutcome,
};
pub use frontier::{Frontier, FrontierEntry};
pub use parser::{clean_text, extract_page, ExtractedPage, EXCLUDED_ELEMENTS};
pub use pdf::extract_pdf_text;
pub use report::{CrawlReport, DepthStats};
