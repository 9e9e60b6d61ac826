use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical form used as the crawl identity key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Lowercase the scheme and host
/// 4. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse duplicate slashes
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment (everything after #)
/// 6. Sort query parameters by key and re-encode them deterministically
/// 7. Remove empty query string (trailing ?)
///
/// Two URLs that normalize to the same string are the same crawl unit, and
/// normalizing an already normalized URL returns it unchanged.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use product_scout::url::normalize_url;
///
/// let url = normalize_url("HTTP://Shop.EXAMPLE.com//Product/42/?b=2&a=1#reviews").unwrap();
/// assert_eq!(url.as_str(), "http://shop.example.com/Product/42?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(&mut url)?;
    Ok(url)
}

/// Normalizes an already parsed URL in place
pub fn normalize_parsed(url: &mut Url) -> Result<(), UrlError> {
    let scheme = url.scheme().to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(UrlError::InvalidScheme(scheme));
    }

    let host = url
        .host_str()
        .map(|h| h.to_lowercase())
        .ok_or(UrlError::MissingDomain)?;
    if host.is_empty() {
        return Err(UrlError::MissingDomain);
    }
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = sorted_query_params(url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(())
}

/// Normalizes a URL path by removing dot segments, duplicate and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from duplicate slashes
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Returns the query parameters sorted by key; values keep their relative order
fn sorted_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}
