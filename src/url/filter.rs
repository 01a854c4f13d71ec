//! Link-level filters applied before scope matching

use url::Url;

/// Schemes that never lead to crawlable content
const SKIPPED_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:", "data:"];

/// Returns true for links that can never be fetched
///
/// Covers empty hrefs, same-page anchors (`#section`) and the
/// `mailto:`/`tel:`/`javascript:`/`data:` pseudo-schemes.
pub fn is_non_fetchable_link(link: &str) -> bool {
    let link = link.trim();
    if link.is_empty() || link.starts_with('#') {
        return true;
    }

    let lower = link.to_ascii_lowercase();
    SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Returns true if the URL path names a PDF document
pub fn is_pdf_url(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf")
}

/// Returns true if the URL path ends with one of the ignored extensions
///
/// PDFs are never ignored, even when `.pdf` appears in the list: they are
/// routed to the PDF extraction path instead.
pub fn has_ignored_extension(url: &Url, ignored: &[String]) -> bool {
    if is_pdf_url(url) {
        return false;
    }

    let path = url.path().to_ascii_lowercase();
    ignored
        .iter()
        .any(|ext| path.ends_with(&ext.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_skip_special_schemes() {
        assert!(is_non_fetchable_link("mailto:test@example.org"));
        assert!(is_non_fetchable_link("tel:+1234567890"));
        assert!(is_non_fetchable_link("javascript:void(0)"));
        assert!(is_non_fetchable_link("JavaScript:alert(1)"));
        assert!(is_non_fetchable_link("data:text/html,<h1>x</h1>"));
    }

    #[test]
    fn test_skip_fragment_and_empty() {
        assert!(is_non_fetchable_link("#section"));
        assert!(is_non_fetchable_link("   "));
        assert!(is_non_fetchable_link(""));
    }

    #[test]
    fn test_regular_links_pass() {
        assert!(!is_non_fetchable_link("/docs/a"));
        assert!(!is_non_fetchable_link("https://example.org/page#frag"));
    }

    #[test]
    fn test_ignored_extension() {
        let ignored = exts(&[".png", ".zip"]);
        let png = Url::parse("https://example.org/logo.PNG").unwrap();
        let zip = Url::parse("https://example.org/files/archive.zip?v=2").unwrap();
        let html = Url::parse("https://example.org/index.html").unwrap();

        assert!(has_ignored_extension(&png, &ignored));
        assert!(has_ignored_extension(&zip, &ignored));
        assert!(!has_ignored_extension(&html, &ignored));
    }

    #[test]
    fn test_pdf_never_ignored() {
        let ignored = exts(&[".pdf", ".png"]);
        let pdf = Url::parse("https://example.org/report.PDF").unwrap();
        assert!(!has_ignored_extension(&pdf, &ignored));
        assert!(is_pdf_url(&pdf));
    }

    #[test]
    fn test_pdf_detection_uses_path_only() {
        let url = Url::parse("https://example.org/view?file=report.pdf").unwrap();
        assert!(!is_pdf_url(&url));
    }
}
