//! Sitemap bootstrapper
//!
//! Looks for sitemaps at a few well-known root locations and returns the page
//! URLs of product-looking sitemaps. Used once per seed domain to jump-start
//! discovery of deep product pages.

use crate::crawler::Fetcher;
use crate::url::{root_join, same_host};
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::collections::HashSet;
use std::io::Cursor;
use url::Url;

/// Root-relative sitemap locations tried for every domain, in order
pub const SITEMAP_CANDIDATES: &[&str] = &["sitemap.xml", "sitemap_index.xml", "sitemap-index.xml"];

const PRODUCT_SITEMAP_TERMS: &[&str] = &["product", "item", "prod"];

/// Returns true if a sitemap location looks like it lists product pages
pub fn is_product_sitemap(location: &str) -> bool {
    let lowered = location.to_lowercase();
    PRODUCT_SITEMAP_TERMS
        .iter()
        .any(|term| lowered.contains(term))
}

/// Discovers candidate product URLs from a domain's sitemaps
#[derive(Debug, Clone)]
pub struct SitemapDiscoverer {
    fetcher: Fetcher,
}

impl SitemapDiscoverer {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Collects page URLs from the product sitemaps of `domain_url`'s site
    ///
    /// Candidates that fail to fetch are skipped. An index is followed into
    /// entries whose location looks like a product sitemap; a plain urlset is
    /// read only if its own location passes the same test. Only URLs on the
    /// domain's host are returned, deduplicated in discovery order.
    pub async fn discover(&self, domain_url: &Url) -> Vec<String> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();

        for candidate in SITEMAP_CANDIDATES {
            let sitemap_url = match root_join(domain_url, candidate) {
                Ok(u) => u,
                Err(e) => {
                    tracing::debug!(domain = %domain_url, error = %e, "Cannot build sitemap URL");
                    return found;
                }
            };

            let body = match self.fetcher.get_with_retry(sitemap_url.as_str()).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(url = %sitemap_url, error = %e, "Sitemap unavailable");
                    continue;
                }
            };

            let urls = if body.contains("<sitemapindex") {
                self.read_index(domain_url, &body).await
            } else if is_product_sitemap(sitemap_url.as_str()) {
                parse_sitemap(&body).page_urls
            } else {
                tracing::debug!(url = %sitemap_url, "Sitemap does not look product-specific, skipping");
                continue;
            };

            for url in urls {
                if !is_on_host(domain_url, &url) {
                    tracing::trace!(url = %url, "Sitemap entry on another host, dropped");
                    continue;
                }
                if seen.insert(url.clone()) {
                    found.push(url);
                }
            }
        }

        tracing::info!(domain = %domain_url, count = found.len(), "Sitemap discovery finished");
        found
    }

    /// Fetches the product sitemaps listed in an index and returns their page URLs
    async fn read_index(&self, domain_url: &Url, body: &str) -> Vec<String> {
        let mut urls = Vec::new();

        for location in parse_sitemap(body).sitemap_urls {
            if !is_product_sitemap(&location) || !is_on_host(domain_url, &location) {
                continue;
            }

            match self.fetcher.get_with_retry(&location).await {
                Ok(child) => urls.extend(parse_sitemap(&child).page_urls),
                Err(e) => {
                    tracing::debug!(url = %location, error = %e, "Child sitemap unavailable");
                }
            }
        }

        urls
    }
}

/// `<loc>` values of a sitemap document, split by entry kind
#[derive(Debug, Default, PartialEq)]
pub struct ParsedSitemap {
    /// `<url><loc>` entries of a urlset
    pub page_urls: Vec<String>,
    /// `<sitemap><loc>` entries of a sitemap index
    pub sitemap_urls: Vec<String>,
}

/// Parses a sitemap or sitemap index; malformed entries are skipped
pub fn parse_sitemap(xml: &str) -> ParsedSitemap {
    let mut parsed = ParsedSitemap::default();
    let reader = SiteMapReader::new(Cursor::new(xml.as_bytes()));

    for entity in reader {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    parsed.page_urls.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    parsed.sitemap_urls.push(url.to_string());
                }
            }
            SiteMapEntity::Err(e) => {
                tracing::trace!(error = ?e, "Skipping malformed sitemap entry");
            }
        }
    }

    parsed
}

fn is_on_host(domain_url: &Url, candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| same_host(domain_url, &u))
        .unwrap_or(false)
}
