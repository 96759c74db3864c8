//! Item extraction
//!
//! Given one listing fragment from a search-results page, the extractor
//! decides whether the item is new and, if so, enriches it: the item's
//! detail page is fetched for the image, seller and location fields, and
//! the embedded description document (when the detail page exposes one) is
//! fetched for the description text.
//!
//! Enrichment degrades per field: a failed detail fetch still emits a
//! record with empty enrichment fields, and a failed description fetch
//! never aborts the record. Only an unparseable price discards an item,
//! because price is structurally required.

use crate::crawler::fetcher::{fetch_url, FetchOutcome};
use crate::crawler::gate::DedupGate;
use crate::url::{canonical_listing_url, derive_item_id};
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Boilerplate substrings stripped from listing titles
const TITLE_NOISE: [&str; 2] = ["Opens in a new window or tab", "New Listing"];

/// Detail-page labels matched (case-insensitively) when assembling location info
const LOCATION_LABELS: [&str; 4] = ["country", "region", "location", "place"];

const SELECTOR_CAROUSEL_IMAGE: &str = ".ux-image-carousel-item.active img";
const SELECTOR_SELLER_BLOCK: &str = ".x-sellercard-atf__info__about-seller";
const SELECTOR_DESCRIPTION_FRAME: &str = ".d-item-description iframe";

/// One item's representation on a search-results page, prior to enrichment
#[derive(Debug, Clone)]
pub struct ListingFragment {
    /// Raw link URL, possibly carrying tracking query parameters
    pub link_href: String,

    /// Raw display title text
    pub title: String,

    /// Listing date text as shown on the feed
    pub listing_date: String,

    /// Display price text, currency symbol included
    pub price_text: String,
}

/// The enriched output unit for one newly-seen listing
#[derive(Debug, Clone, Serialize)]
pub struct ItemRecord {
    pub identifier: String,
    pub url: String,
    pub name: String,
    pub image_url: String,
    pub description: String,
    pub listing_date: String,
    pub seller_name: String,
    pub seller_url: String,
    pub price: i64,
    pub location_info: String,
}

/// Outcome of extracting one listing fragment
#[derive(Debug)]
pub enum ExtractOutcome {
    /// Newly-seen item with its enriched record
    New(Box<ItemRecord>),

    /// Identifier was in the ledger snapshot or already produced this run
    AlreadySeen,

    /// Fragment discarded (unusable link or price); logged, never fatal
    Skipped,
}

/// Errors that abort extraction of a single item
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("price {0:?} is not a whole currency amount")]
    Price(String),

    #[error("listing link is unusable: {0}")]
    Link(#[from] crate::UrlError),
}

/// Extracts enriched records for listings that pass the dedup gate
///
/// Clones share the HTTP client and the gate, so one extractor can be
/// handed to every worker on a page.
#[derive(Clone)]
pub struct ItemExtractor {
    client: Client,
    gate: Arc<DedupGate>,
}

impl ItemExtractor {
    pub fn new(client: Client, gate: Arc<DedupGate>) -> Self {
        Self { client, gate }
    }

    /// Decides whether the fragment is new and, if so, produces its record
    ///
    /// The identifier is reserved before any network work, so two fragments
    /// resolving to the same identifier cannot both produce a record even
    /// when extracted concurrently.
    pub async fn extract(&self, fragment: ListingFragment) -> ExtractOutcome {
        let (canonical, identifier) = match listing_identity(&fragment.link_href) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("Skipping fragment: {}", e);
                return ExtractOutcome::Skipped;
            }
        };

        if !self.gate.try_claim(&identifier) {
            tracing::debug!("Already seen: {}", identifier);
            return ExtractOutcome::AlreadySeen;
        }

        let price = match parse_price(&fragment.price_text) {
            Ok(price) => price,
            Err(e) => {
                // No record will exist for this item, so the reservation
                // must not stand: a later fragment (or a later run) can
                // still collect it.
                self.gate.release(&identifier);
                tracing::warn!("Skipping {}: {}", identifier, e);
                return ExtractOutcome::Skipped;
            }
        };

        let name = clean_listing_title(&fragment.title);
        let detail = self.fetch_detail(canonical.as_str()).await;

        let description = match &detail.description_url {
            Some(src) => self.fetch_description(src).await,
            None => String::new(),
        };

        ExtractOutcome::New(Box::new(ItemRecord {
            identifier,
            url: canonical.to_string(),
            name,
            image_url: detail.image_url,
            description,
            listing_date: fragment.listing_date,
            seller_name: detail.seller_name,
            seller_url: detail.seller_url,
            price,
            location_info: detail.location_info,
        }))
    }

    /// Fetches and parses the detail page, degrading to empty fields
    async fn fetch_detail(&self, url: &str) -> DetailData {
        match fetch_url(&self.client, url).await {
            FetchOutcome::Success { body, .. } => parse_detail_page(&body),
            FetchOutcome::HttpError { status } => {
                tracing::warn!(
                    "Detail fetch for {} returned HTTP {}, emitting partial record",
                    url,
                    status
                );
                DetailData::default()
            }
            FetchOutcome::NetworkError { error } => {
                tracing::warn!(
                    "Detail fetch for {} failed ({}), emitting partial record",
                    url,
                    error
                );
                DetailData::default()
            }
        }
    }

    /// Fetches the embedded description document; failure yields no text
    async fn fetch_description(&self, url: &str) -> String {
        match fetch_url(&self.client, url).await {
            FetchOutcome::Success { body, .. } => parse_description_body(&body),
            FetchOutcome::HttpError { status } => {
                tracing::warn!("Description fetch for {} returned HTTP {}", url, status);
                String::new()
            }
            FetchOutcome::NetworkError { error } => {
                tracing::warn!("Description fetch for {} failed: {}", url, error);
                String::new()
            }
        }
    }
}

/// Canonical URL and identifier for a fragment's link
fn listing_identity(href: &str) -> Result<(Url, String), ExtractError> {
    let canonical = canonical_listing_url(href)?;
    let identifier = derive_item_id(&canonical)?;
    Ok((canonical, identifier))
}

/// Strips marketplace boilerplate from a listing title
fn clean_listing_title(raw: &str) -> String {
    let mut title = raw.to_string();
    for noise in TITLE_NOISE {
        title = title.replace(noise, "");
    }
    title.trim().to_string()
}

/// Parses a display price into a whole currency amount
///
/// Currency symbols are stripped; the remainder must be a plain integer.
/// Grouped amounts like `$1,250` do not parse and skip the item.
fn parse_price(text: &str) -> Result<i64, ExtractError> {
    let stripped = text.replace('$', "");
    stripped
        .trim()
        .parse::<i64>()
        .map_err(|_| ExtractError::Price(text.to_string()))
}

/// Fields extracted from an item detail page
#[derive(Debug, Default)]
struct DetailData {
    image_url: String,
    seller_name: String,
    seller_url: String,
    location_info: String,
    description_url: Option<String>,
}

/// Parses a detail page; every absent field degrades to its default
fn parse_detail_page(html: &str) -> DetailData {
    let document = Html::parse_document(html);

    let (seller_name, seller_url) = seller_info(&document).unwrap_or_default();

    DetailData {
        image_url: active_carousel_image(&document).unwrap_or_default(),
        seller_name,
        seller_url,
        location_info: scan_location_labels(&document),
        description_url: description_frame_src(&document),
    }
}

/// URL of the first active carousel image, if any
fn active_carousel_image(document: &Html) -> Option<String> {
    let selector = Selector::parse(SELECTOR_CAROUSEL_IMAGE).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

/// Seller display name and profile URL from the seller-info block
fn seller_info(document: &Html) -> Option<(String, String)> {
    let block_selector = Selector::parse(SELECTOR_SELLER_BLOCK).ok()?;
    let block = document.select(&block_selector).next()?;

    let name = block.text().collect::<String>().trim().to_string();

    let link_selector = Selector::parse("a").ok()?;
    let url = block
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default()
        .to_string();

    Some((name, url))
}

/// Concatenates every label/value pair whose label names a geographic field
///
/// Labels and values are paired positionally, the way the page lays out its
/// `<dt>`/`<dd>` item-specifics list. No matching label yields an empty
/// string.
fn scan_location_labels(document: &Html) -> String {
    let label_selector = match Selector::parse("dt") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };
    let value_selector = match Selector::parse("dd") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };

    let mut info = String::new();
    for (label, value) in document
        .select(&label_selector)
        .zip(document.select(&value_selector))
    {
        let label_text = label.text().collect::<String>().trim().to_string();
        let lowered = label_text.to_lowercase();

        if LOCATION_LABELS.iter().any(|needle| lowered.contains(needle)) {
            let value_text = value.text().collect::<String>().trim().to_string();
            info.push_str(&label_text);
            info.push_str(": ");
            info.push_str(&value_text);
            info.push('\n');
        }
    }

    info
}

/// `src` of the embedded description document, if the page exposes one
fn description_frame_src(document: &Html) -> Option<String> {
    let selector = Selector::parse(SELECTOR_DESCRIPTION_FRAME).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|frame| frame.value().attr("src"))
        .map(str::to_string)
}

/// Visible body text of a description document
fn parse_description_body(html: &str) -> String {
    let document = Html::parse_document(html);

    match Selector::parse("body") {
        Ok(selector) => document
            .select(&selector)
            .next()
            .map(|body| body.text().collect::<String>().trim().to_string())
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}
