//! URL handling module for Sumi-Scribe
//!
//! This module provides URL normalization, host matching, link filtering and
//! the crawl scope that confines a run to one site or one section of it.

mod domain;
mod filter;
mod normalize;

use crate::{UrlError, UrlResult};
use serde::Deserialize;
use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, host_matches, strip_www};
pub use filter::{has_ignored_extension, is_non_fetchable_link, is_pdf_url};
pub use normalize::normalize_url;

/// How far a crawl may wander from its start URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, clap::ValueEnum)]
pub enum ScopePolicy {
    /// Same host or any subdomain of it, `www.` ignored
    #[serde(rename = "domain-only")]
    #[value(name = "domain-only")]
    DomainOnly,

    /// URL must live under the start URL's path
    #[default]
    #[serde(rename = "domain-path")]
    #[value(name = "domain-path")]
    DomainAndPathPrefix,
}

impl fmt::Display for ScopePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainOnly => write!(f, "domain-only"),
            Self::DomainAndPathPrefix => write!(f, "domain-path"),
        }
    }
}

/// The boundary a crawl is restricted to
#[derive(Debug, Clone)]
pub struct Scope {
    root: String,
    host: String,
    policy: ScopePolicy,
    ignored_extensions: Vec<String>,
}

impl Scope {
    /// Builds a scope from a start URL
    ///
    /// # Returns
    ///
    /// * `Ok(Scope)` - The start URL is an absolute http(s) URL with a host
    /// * `Err(UrlError)` - The start URL cannot anchor a crawl
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_scribe::url::{Scope, ScopePolicy};
    ///
    /// let scope = Scope::new("https://example.org/docs/", ScopePolicy::DomainAndPathPrefix).unwrap();
    /// assert!(scope.contains("https://example.org/docs/a"));
    /// assert!(!scope.contains("https://example.org/blog"));
    /// ```
    pub fn new(start_url: &str, policy: ScopePolicy) -> UrlResult<Self> {
        let root = normalize_url(start_url.trim());
        let parsed = Url::parse(&root).map_err(|e| UrlError::Parse(e.to_string()))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                parsed.scheme()
            )));
        }

        let host = extract_domain(&parsed).ok_or(UrlError::MissingDomain)?;

        Ok(Self {
            root,
            host,
            policy,
            ignored_extensions: Vec::new(),
        })
    }

    /// Sets the path suffixes this scope rejects
    pub fn with_ignored_extensions(mut self, extensions: &[String]) -> Self {
        self.ignored_extensions = extensions.iter().map(|e| e.to_ascii_lowercase()).collect();
        self
    }

    /// The normalized start URL
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The lowercase host of the start URL
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn policy(&self) -> ScopePolicy {
        self.policy
    }

    /// Checks whether a URL may be crawled under this scope
    pub fn contains(&self, url: &str) -> bool {
        if is_non_fetchable_link(url) {
            return false;
        }

        let parsed = match Url::parse(url.trim()) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return false;
        }

        if has_ignored_extension(&parsed, &self.ignored_extensions) {
            return false;
        }

        match self.policy {
            ScopePolicy::DomainOnly => match parsed.host_str() {
                Some(host) => host_matches(&self.host, host),
                None => false,
            },
            ScopePolicy::DomainAndPathPrefix => {
                under_prefix(&self.root, &normalize_url(url.trim()))
            }
        }
    }
}

/// Checks `candidate` starts with `root` and the match ends on a URL boundary
fn under_prefix(root: &str, candidate: &str) -> bool {
    let Some(rest) = candidate.strip_prefix(root) else {
        return false;
    };

    rest.is_empty() || root.ends_with('/') || rest.starts_with(['/', '?', '#'])
}

/// Free-function form of [`Scope::contains`]
pub fn in_scope(url: &str, scope: &Scope) -> bool {
    scope.contains(url)
}
