//! HTML parser for extracting crawlable links
//!
//! Only `<a href>` anchors are considered. Each href goes through
//! [`resolve_link`] (scheme, host and resource-type filtering) and is then
//! normalized, so the returned URLs are ready to be used as visited-set keys.

use crate::url::{normalize_parsed, resolve_link};
use crate::UrlError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Extracts same-host, normalized links from an HTML document
///
/// The result is deduplicated and keeps document order of first occurrence.
/// Malformed markup never fails: the HTML parser recovers from anything, and
/// at worst no anchors are found. If `cancel` fires mid-document, the links
/// collected so far are returned.
///
/// # Example
///
/// ```
/// use product_scout::crawler::extract_links;
/// use tokio_util::sync::CancellationToken;
/// use url::Url;
///
/// let html = r#"<html><body>
///     <a href="/product/1#reviews">Shoe</a>
///     <a href="/product/1">Same shoe</a>
///     <a href="https://elsewhere.com/">Partner</a>
/// </body></html>"#;
/// let base = Url::parse("https://shop.example.com/").unwrap();
///
/// let links = extract_links(&base, html, &CancellationToken::new());
/// assert_eq!(links, vec!["https://shop.example.com/product/1"]);
/// ```
pub fn extract_links(base_url: &Url, html: &str, cancel: &CancellationToken) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if cancel.is_cancelled() {
            tracing::debug!(base = %base_url, collected = links.len(), "Link extraction cancelled");
            break;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let mut resolved = match resolve_link(base_url, href) {
            Ok(url) => url,
            Err(e) => {
                log_rejection(href, &e);
                continue;
            }
        };

        if let Err(e) = normalize_parsed(&mut resolved) {
            log_rejection(href, &e);
            continue;
        }
        let normalized = resolved.to_string();

        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }

    links
}

/// Filtering outcomes are expected; keep them out of the normal log levels
fn log_rejection(href: &str, error: &UrlError) {
    match error {
        UrlError::Parse(_) => tracing::debug!(href = %href, error = %error, "Unresolvable link"),
        _ => tracing::trace!(href = %href, reason = %error, "Link skipped"),
    }
}
