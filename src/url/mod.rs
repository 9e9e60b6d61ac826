//! URL handling module for Product Scout
//!
//! This module provides URL normalization, link resolution and filtering, and
//! domain/origin helpers. Everything here is pure: no I/O, no shared state.

mod domain;
mod filter;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, origin_of, same_host};
pub use filter::{is_non_html_resource, resolve_link};
pub use normalize::{normalize_parsed, normalize_url};

use crate::UrlError;
use url::Url;

/// Builds the robots.txt location for the origin of `url`
///
/// # Examples
///
/// ```
/// use product_scout::url::robots_url;
/// use url::Url;
///
/// let url = Url::parse("https://shop.example.com/product/1?x=2").unwrap();
/// assert_eq!(
///     robots_url(&url).unwrap().as_str(),
///     "https://shop.example.com/robots.txt"
/// );
/// ```
pub fn robots_url(url: &Url) -> Result<Url, UrlError> {
    let origin = origin_of(url).ok_or(UrlError::MissingDomain)?;
    Url::parse(&format!("{}/robots.txt", origin)).map_err(|e| UrlError::Parse(e.to_string()))
}

/// Builds a URL for `path` at the root of the origin of `url`
pub fn root_join(url: &Url, path: &str) -> Result<Url, UrlError> {
    let origin = origin_of(url).ok_or(UrlError::MissingDomain)?;
    Url::parse(&format!("{}/{}", origin, path.trim_start_matches('/')))
        .map_err(|e| UrlError::Parse(e.to_string()))
}
