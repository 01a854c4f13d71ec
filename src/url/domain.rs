use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scribe::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.ORG/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.org".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Removes a single leading `www.` label
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Checks whether `candidate` is `base` or one of its subdomains
///
/// A leading `www.` is ignored on both sides and the comparison is
/// case-insensitive, so `www.example.org` admits `docs.example.org` and
/// `example.org`, but never `notexample.org` or `example.org.evil.net`.
///
/// # Examples
///
/// ```
/// use sumi_scribe::url::host_matches;
///
/// assert!(host_matches("www.example.org", "example.org"));
/// assert!(host_matches("example.org", "api.v2.example.org"));
/// assert!(!host_matches("example.org", "myexample.org"));
/// ```
pub fn host_matches(base: &str, candidate: &str) -> bool {
    let base = base.to_lowercase();
    let candidate = candidate.to_lowercase();
    let base = strip_www(&base);
    let candidate = strip_www(&candidate);

    if base.is_empty() || candidate.is_empty() {
        return false;
    }

    candidate == base || candidate.ends_with(&format!(".{}", base))
}
