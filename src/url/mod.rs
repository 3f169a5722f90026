//! URL handling for catalog crawls
//!
//! This module renders paginated catalog URLs from their templates, resolves
//! links found in listing markup, and pulls path segments out of detail URLs.

use crate::{UrlError, UrlResult};
use url::Url;

/// Placeholder for the page number in a catalog URL template
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Placeholder for the nominal page size
pub const SIZE_PLACEHOLDER: &str = "{size}";

/// Placeholder for the zero-based tile offset (`page * size`)
pub const OFFSET_PLACEHOLDER: &str = "{offset}";

/// Renders the listing URL for one page of a catalog
///
/// The template must contain `{page}` or `{offset}`; `{size}` is optional.
///
/// # Examples
///
/// ```
/// use inventory_harvest::url::page_url;
///
/// let url = page_url("https://dealer.example/new?page={page}&size={size}", 2, 24).unwrap();
/// assert_eq!(url.as_str(), "https://dealer.example/new?page=2&size=24");
/// ```
pub fn page_url(template: &str, page: u32, size: u32) -> UrlResult<Url> {
    if !template.contains(PAGE_PLACEHOLDER) && !template.contains(OFFSET_PLACEHOLDER) {
        return Err(UrlError::MissingPlaceholder(template.to_string()));
    }

    let offset = u64::from(page) * u64::from(size);
    let rendered = template
        .replace(PAGE_PLACEHOLDER, &page.to_string())
        .replace(SIZE_PLACEHOLDER, &size.to_string())
        .replace(OFFSET_PLACEHOLDER, &offset.to_string());

    let url = Url::parse(&rendered).map_err(|e| UrlError::Malformed(format!("{}: {}", rendered, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: links
/// - anything that is not http(s) after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
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

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

/// Returns the non-empty path segment at `index`, if present
///
/// Negative-style lookups are not supported; callers that want the segment
/// before the item slug should use [`parent_segment`].
pub fn path_segment(url: &str, index: usize) -> Option<String> {
    segments(url)?.into_iter().nth(index)
}

/// Returns the second-to-last non-empty path segment
///
/// Detail URLs usually end in an item slug, so this is the segment naming
/// the collection the item lives in.
pub fn parent_segment(url: &str) -> Option<String> {
    let mut parts = segments(url)?;
    if parts.len() < 2 {
        return None;
    }
    parts.pop();
    parts.pop()
}

fn segments(url: &str) -> Option<Vec<String>> {
    let parsed = Url::parse(url).ok()?;
    Some(
        parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
