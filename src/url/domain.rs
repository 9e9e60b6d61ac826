use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use product_scout::url::extract_domain;
///
/// let url = Url::parse("https://example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://sub.example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the `scheme://host[:port]` origin of a URL
///
/// The port is only included when it differs from the scheme default. This
/// is the key robots.txt policies are cached under.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use product_scout::url::origin_of;
///
/// let url = Url::parse("https://Shop.example.com/p/1?x=1").unwrap();
/// assert_eq!(origin_of(&url), Some("https://shop.example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(origin_of(&url), Some("http://127.0.0.1:8080".to_string()));
/// ```
pub fn origin_of(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    match url.port() {
        Some(port) => Some(format!("{}://{}:{}", url.scheme(), host, port)),
        None => Some(format!("{}://{}", url.scheme(), host)),
    }
}

/// Checks whether two URLs point at the same host and port
///
/// Scheme differences are ignored, so a site linking between its http and
/// https pages stays one crawl domain. Only explicit (non-default) ports are
/// compared.
pub fn same_host(a: &Url, b: &Url) -> bool {
    extract_domain(a).is_some() && extract_domain(a) == extract_domain(b) && a.port() == b.port()
}
