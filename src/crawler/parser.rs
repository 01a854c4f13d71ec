//! HTML parser for extracting text and links
//!
//! This module turns a raw HTML document into:
//! - readable, whitespace-collapsed text with page chrome removed
//! - the links to follow (from `<a>` tags and canonical links)

use crate::url::is_non_fetchable_link;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose content never reaches the extracted text
pub const EXCLUDED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "aside", "iframe", "svg", "form",
    "template",
];

/// Text and links extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Whitespace-collapsed visible text
    pub text: String,

    /// Absolute http(s) links without fragments, in document order
    pub links: Vec<String>,
}

/// Extracts text and links from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document, nav and footer included
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
/// - Anything that does not resolve to http(s)
///
/// Relative links resolve against `<base href>` when present, otherwise
/// against `page_url`. Duplicates keep their first position.
///
/// # Example
///
/// ```
/// use sumi_scribe::crawler::extract_page;
///
/// let html = r#"<html><body><nav><a href="/docs">Docs</a></nav><p>Hello   world</p></body></html>"#;
/// let page = extract_page(html, "https://example.org/");
/// assert_eq!(page.text, "Hello world");
/// assert_eq!(page.links, vec!["https://example.org/docs".to_string()]);
/// ```
pub fn extract_page(html: &str, page_url: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let text = extract_text(&document);
    let links = match Url::parse(page_url) {
        Ok(page_url) => {
            let base_url = document_base(&document, &page_url);
            extract_links(&document, &base_url)
        }
        Err(e) => {
            tracing::debug!("Cannot resolve links against {}: {}", page_url, e);
            Vec::new()
        }
    };

    ExtractedPage { text, links }
}

/// Collapses every whitespace run to one space and trims the ends
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_text(document: &Html) -> String {
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);
    clean_text(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if EXCLUDED_ELEMENTS.contains(&child_element.value().name()) {
                continue;
            }
            collect_text(child_element, out);
        }
    }
}

/// Picks the URL relative links resolve against
fn document_base(document: &Html, page_url: &Url) -> Url {
    if let Ok(base_selector) = Selector::parse("base[href]") {
        if let Some(href) = document
            .select(&base_selector)
            .next()
            .and_then(|element| element.value().attr("href"))
        {
            if let Ok(base) = page_url.join(href.trim()) {
                return base;
            }
        }
    }

    page_url.clone()
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let mut push = |href: &str| {
        if let Some(absolute_url) = resolve_link(href, base_url) {
            if seen.insert(absolute_url.clone()) {
                links.push(absolute_url);
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL without fragment
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if is_non_fetchable_link(href) {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);

    Some(absolute_url.to_string())
}
