/// Normalizes a URL string for ledger and frontier keys
///
/// # Normalization Steps
///
/// 1. Drop the fragment (everything from the first `#`)
/// 2. Drop trailing slashes
///
/// Trimming is skipped when it would leave nothing but a scheme (`https://`)
/// or an empty string; the defragmented input is returned unchanged then.
/// The function is total and idempotent: `normalize_url(&normalize_url(x))`
/// always equals `normalize_url(x)`.
///
/// # Examples
///
/// ```
/// use sumi_scribe::url::normalize_url;
///
/// assert_eq!(normalize_url("https://example.org/docs/#intro"), "https://example.org/docs");
/// assert_eq!(normalize_url("https://example.org/"), "https://example.org");
/// assert_eq!(normalize_url("https://"), "https://");
/// ```
pub fn normalize_url(url: &str) -> String {
    let defragmented = match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    };

    let trimmed = defragmented.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.ends_with(':') {
        return defragmented.to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fragment() {
        assert_eq!(
            normalize_url("https://example.org/page#section"),
            "https://example.org/page"
        );
    }

    #[test]
    fn test_strip_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.org/docs/"),
            "https://example.org/docs"
        );
    }

    #[test]
    fn test_root_loses_slash_but_keeps_host() {
        assert_eq!(normalize_url("https://example.org/"), "https://example.org");
        assert_eq!(normalize_url("https://example.org"), "https://example.org");
    }

    #[test]
    fn test_fragment_then_slash() {
        assert_eq!(
            normalize_url("https://example.org/docs/#top"),
            "https://example.org/docs"
        );
    }

    #[test]
    fn test_repeated_slashes() {
        assert_eq!(
            normalize_url("https://example.org/docs//"),
            "https://example.org/docs"
        );
    }

    #[test]
    fn test_bare_scheme_not_collapsed() {
        assert_eq!(normalize_url("https://"), "https://");
        assert_eq!(normalize_url("https:///"), "https:///");
        assert_eq!(normalize_url("///"), "///");
        assert_eq!(normalize_url("/"), "/");
    }

    #[test]
    fn test_empty_and_fragment_only() {
        assert_eq!(normalize_url(""), "");
        assert_eq!(normalize_url("#top"), "");
    }

    #[test]
    fn test_query_preserved() {
        assert_eq!(
            normalize_url("https://example.org/search?q=1#results"),
            "https://example.org/search?q=1"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "https://example.org/docs/",
            "https://example.org/docs//#a/",
            "https://example.org/#",
            "https://",
            "https:///",
            "http://a.b/c/?x=/",
            "#/",
            "/#/",
            "",
            "///",
            "mailto:someone@example.org",
            "https://example.org/a#b#c/",
        ];

        for input in inputs {
            let once = normalize_url(input);
            let twice = normalize_url(&once);
            assert_eq!(once, twice, "normalization not idempotent for {:?}", input);
        }
    }
}
