use crate::{UrlError, UrlResult};
use url::Url;

/// Prefix applied to every identifier derived from a listing URL
pub const ITEM_ID_PREFIX: &str = "id-";

/// Canonicalizes a listing link: query parameters and fragments are
/// stripped, leaving only the stable item path.
///
/// # Example
///
/// ```
/// use freshlist::url::canonical_listing_url;
///
/// let url = canonical_listing_url("https://www.ebay.com/itm/1234?hash=abc#top").unwrap();
/// assert_eq!(url.as_str(), "https://www.ebay.com/itm/1234");
/// ```
pub fn canonical_listing_url(href: &str) -> UrlResult<Url> {
    let mut url =
        Url::parse(href.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Derives the deduplication identifier from a canonical listing URL.
///
/// The identifier is the last non-empty path segment prefixed with
/// [`ITEM_ID_PREFIX`], so `/itm/1234` and `/itm/1234/` resolve identically.
pub fn derive_item_id(canonical: &Url) -> UrlResult<String> {
    let segment = canonical
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| UrlError::MissingItemSegment(canonical.to_string()))?;

    Ok(format!("{}{}", ITEM_ID_PREFIX, segment))
}
