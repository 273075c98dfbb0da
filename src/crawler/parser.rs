//! HTML parser for extracting repository references
//!
//! This module parses an awesome-list page and collects the repositories its
//! `<a href>` links point at, deduplicated in first-seen order.

use crate::url::{RepositoryLink, RepositoryMatcher};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Number of `<a href>` links inspected
    pub links_seen: usize,

    /// Distinct repositories referenced, in order of first appearance,
    /// each with the link it first appeared under
    pub links: Vec<RepositoryLink>,
}

/// Parses HTML content and extracts repository references
///
/// # Link Rules
///
/// - Only `<a href="...">` targets are considered
/// - Relative hrefs are resolved against `base_url`
/// - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only hrefs are skipped
/// - The resolved URL must have the repository shape accepted by `matcher`
/// - Repeated references keep their first position
///
/// # Example
///
/// ```
/// use awesome_metrics::crawler::parse_html;
/// use awesome_metrics::url::RepositoryMatcher;
/// use url::Url;
///
/// let html = r#"<html><head><title>Awesome</title></head><body>
///     <a href="https://github.com/tokio-rs/tokio">tokio</a>
///     <a href="https://github.com/tokio-rs/tokio#readme">tokio again</a>
/// </body></html>"#;
/// let base_url = Url::parse("https://example.com/awesome").unwrap();
/// let parsed = parse_html(html, &base_url, &RepositoryMatcher::default());
/// assert_eq!(parsed.title, Some("Awesome".to_string()));
/// assert_eq!(parsed.links.len(), 1);
/// assert_eq!(parsed.links[0].url, "https://github.com/tokio-rs/tokio");
/// ```
pub fn parse_html(html: &str, base_url: &Url, matcher: &RepositoryMatcher) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let (links, links_seen) = extract_links(&document, base_url, matcher);

    ParsedPage {
        title,
        links_seen,
        links,
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects distinct repository links from `<a>` tags
fn extract_links(
    document: &Html,
    base_url: &Url,
    matcher: &RepositoryMatcher,
) -> (Vec<RepositoryLink>, usize) {
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    let mut links_seen = 0;

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return (links, links_seen);
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        links_seen += 1;

        let Some(url) = resolve_link(href, base_url) else {
            continue;
        };

        if let Some(reference) = matcher.match_url(&url) {
            if seen.insert(reference.clone()) {
                links.push(RepositoryLink {
                    reference,
                    url: url.into(),
                });
            }
        }
    }

    (links, links_seen)
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only anchors
/// - Invalid URLs
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    base_url.join(href).ok()
}
