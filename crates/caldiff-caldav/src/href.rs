//! Href resolution against an optional base URL.

use url::Url;

/// Resolves an href against a base URL.
///
/// Absolute hrefs pass through unchanged; relative ones are joined to the
/// base. Without a base, the href is returned as received.
pub fn resolve_href(base: Option<&Url>, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    match base {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}
