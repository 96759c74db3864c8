//! URL handling for listing identity
//!
//! A listing's deduplication identifier is derived from its canonical URL:
//! query parameters and fragments are stripped, and the final path segment
//! is prefixed with a fixed marker. The same underlying item always yields
//! the same identifier across runs.

mod ident;

pub use ident::{canonical_listing_url, derive_item_id, ITEM_ID_PREFIX};
