use crate::url::domain::same_host;
use crate::UrlError;
use url::Url;

/// Schemes that can never lead to a crawlable page
const NON_NAVIGABLE_SCHEMES: &[&str] = &["mailto:", "tel:", "data:", "chrome-extension:"];

/// Path extensions of resources that are not HTML documents
const NON_HTML_EXTENSIONS: &[&str] = &[
    // Images
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "avif",
    // Documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv",
    // Archives
    "zip", "tar", "gz", "rar", "7z",
    // Media
    "mp3", "mp4", "avi", "mov", "wav", "webm",
    // Stylesheets, scripts and fonts
    "css", "js", "woff", "woff2", "ttf",
];

/// Resolves an anchor href against the page URL and decides if it is crawlable
///
/// # Filtering Rules
///
/// | Check | Rejection |
/// |-------|-----------|
/// | empty, `#` or `javascript:` | `InvalidLink` |
/// | `mailto:`, `tel:`, `data:`, `chrome-extension:` | `InvalidScheme` |
/// | resolution fails | `Parse` |
/// | resolved scheme not http/https | `InvalidScheme` |
/// | host differs from the base host | `ExternalDomain` |
/// | known non-HTML file extension | `NonHtmlResource` |
///
/// The returned URL has its fragment stripped but is otherwise not normalized.
///
/// # Examples
///
/// ```
/// use product_scout::url::resolve_link;
/// use product_scout::UrlError;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example.com/category/shoes").unwrap();
///
/// let link = resolve_link(&base, "/product/42#reviews").unwrap();
/// assert_eq!(link.as_str(), "https://shop.example.com/product/42");
///
/// assert!(matches!(
///     resolve_link(&base, "https://other.com/product/1"),
///     Err(UrlError::ExternalDomain(_))
/// ));
/// ```
pub fn resolve_link(base: &Url, href: &str) -> Result<Url, UrlError> {
    let href = href.trim();
    let lowered = href.to_ascii_lowercase();

    if href.is_empty() || href == "#" || lowered.starts_with("javascript:") {
        return Err(UrlError::InvalidLink(href.to_string()));
    }

    if NON_NAVIGABLE_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return Err(UrlError::InvalidScheme(href.to_string()));
    }

    let mut absolute = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;
    absolute.set_fragment(None);

    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return Err(UrlError::InvalidScheme(absolute.scheme().to_string()));
    }

    if !same_host(base, &absolute) {
        return Err(UrlError::ExternalDomain(absolute.to_string()));
    }

    if is_non_html_resource(&absolute) {
        return Err(UrlError::NonHtmlResource(absolute.to_string()));
    }

    Ok(absolute)
}

/// Checks the last path segment's extension against known non-HTML types
pub fn is_non_html_resource(url: &Url) -> bool {
    let last_segment = url.path().rsplit('/').next().unwrap_or("");

    match last_segment.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            NON_HTML_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}
