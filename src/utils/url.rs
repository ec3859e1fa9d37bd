// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Last non-empty path segment of a URL, if any.
///
/// # Examples
/// ```
/// use regulus::utils::url::file_name;
///
/// let url = url::Url::parse("https://www.govinfo.gov/pkg/2025-00636.pdf").unwrap();
/// assert_eq!(file_name(&url), Some("2025-00636.pdf".to_string()));
/// ```
pub fn file_name(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// Whether the URL path ends with `extension`, ignoring case.
pub fn has_extension(url: &Url, extension: &str) -> bool {
    url.path()
        .to_ascii_lowercase()
        .ends_with(&extension.to_ascii_lowercase())
}
