//! HTML extractor for page text, images and links
//!
//! This module handles parsing HTML content to extract:
//! - The human-visible text of the document body
//! - Image sources to download
//! - Same-host links to follow
//!
//! Parsing is best-effort: html5ever recovers from malformed markup, so a
//! broken page yields whatever could be salvaged instead of an error.

use crate::url::{resolve_http_url, same_host};
use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text content is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Visible body text, whitespace-normalized
    pub text: String,

    /// Absolute image URLs in document order, without duplicates
    pub image_urls: Vec<Url>,

    /// Absolute same-host link URLs in document order, without duplicates
    pub link_urls: Vec<Url>,
}

/// Parses HTML content and extracts text, images and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` resolving to an http(s) URL on the same host as `base_url`
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` references
/// - Fragment-only references (same page anchors)
/// - Links to any other host (dropped here, never offered to the frontier)
///
/// Image sources follow the same resolution rules but are not host-filtered.
///
/// # Example
///
/// ```
/// use site_harvester::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<html><body><p>Hello</p><a href="/next">Next</a><img src="a.png"></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = parse_page(html, &base_url);
/// assert_eq!(page.text, "Hello Next");
/// assert_eq!(page.link_urls[0].as_str(), "https://example.com/next");
/// assert_eq!(page.image_urls[0].as_str(), "https://example.com/a.png");
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> ExtractedPage {
    let document = Html::parse_document(html);

    ExtractedPage {
        text: extract_text(&document),
        image_urls: extract_images(&document, base_url),
        link_urls: extract_links(&document, base_url),
    }
}

/// Concatenates the visible text nodes of `<body>` in document order
fn extract_text(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };

    let mut words: Vec<&str> = Vec::new();
    for body in document.select(&body_selector) {
        for node in body.descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };

            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |element| HIDDEN_ELEMENTS.contains(&element.name()))
            });
            if hidden {
                continue;
            }

            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

/// Extracts all image sources, resolved against `base_url`
fn extract_images(document: &Html, base_url: &Url) -> Vec<Url> {
    collect_attribute(document, "img[src]", "src", base_url, |_| true)
}

/// Extracts all same-host anchor targets, resolved against `base_url`
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    collect_attribute(document, "a[href]", "href", base_url, |url| {
        same_host(url, base_url)
    })
}

fn collect_attribute(
    document: &Html,
    selector: &str,
    attribute: &str,
    base_url: &Url,
    keep: impl Fn(&Url) -> bool,
) -> Vec<Url> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attribute))
        .filter_map(|reference| resolve_http_url(reference, base_url))
        .filter(|url| keep(url))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}
