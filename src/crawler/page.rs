//! Search-results page processing
//!
//! One call fetches a single search page, parses its listing fragments and
//! pagination control, and runs every fragment through the item extractor
//! on a bounded worker pool. The caller (the crawl controller) owns the
//! decision of whether to continue to the next page.

use crate::config::Config;
use crate::crawler::extractor::{ExtractOutcome, ItemExtractor, ItemRecord, ListingFragment};
use crate::crawler::fetcher::{fetch_url, FetchOutcome};
use crate::{FreshlistError, Result};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Number of leading result slots occupied by promotional tiles, not listings
const LEADING_PROMO_SLOTS: usize = 2;

const SELECTOR_ITEM_WRAPPER: &str = ".s-item__wrapper";
const SELECTOR_ITEM_LINK: &str = ".s-item__link";
const SELECTOR_LISTING_DATE: &str = ".s-item__listingDate";
const SELECTOR_ITEM_PRICE: &str = ".s-item__price";
const SELECTOR_NEXT_PAGE: &str = ".pagination__next";

/// Result of fully processing one search-results page
#[derive(Debug, Default)]
pub struct PageOutcome {
    /// Records for fragments that were new, in fragment order
    pub records: Vec<ItemRecord>,

    /// True when any fragment on this page resolved to a known identifier
    pub hit_already_seen: bool,

    /// True when the pagination control carries no forward link
    pub is_final_page: bool,
}

/// Builds the search URL for one result page
///
/// The query encodes the configured keywords, the minimum-price filter,
/// newest-first ordering and the page size, plus the page number.
pub fn search_page_url(config: &Config, page_number: u32) -> Result<Url> {
    let mut url = Url::parse(&config.search.base_url)?;

    url.query_pairs_mut()
        .append_pair("_from", "R40")
        .append_pair("_nkw", &config.search.query)
        .append_pair("_udlo", &config.search.min_price.to_string())
        .append_pair("_sop", "10")
        .append_pair("_ipg", &config.search.page_size.to_string())
        .append_pair("_pgn", &page_number.to_string())
        .append_pair("rt", "nc");

    Ok(url)
}

/// Fetches one search page and extracts every listing fragment on it
///
/// A non-success status or transport failure on the search page itself is
/// fatal: the controller cannot decide termination without the page.
/// Fragment-level work is fanned out across at most `max_concurrent_items`
/// tasks; results are restored to fragment order before accumulation, and
/// `hit_already_seen` is decided only after every fragment has finished.
pub async fn process_search_page(
    client: &reqwest::Client,
    extractor: &ItemExtractor,
    url: &Url,
    max_concurrent_items: usize,
) -> Result<PageOutcome> {
    let body = match fetch_url(client, url.as_str()).await {
        FetchOutcome::Success { body, .. } => body,
        FetchOutcome::HttpError { status } => {
            return Err(FreshlistError::SearchFetch {
                url: url.to_string(),
                status,
            });
        }
        FetchOutcome::NetworkError { error } => {
            return Err(FreshlistError::SearchUnreachable {
                url: url.to_string(),
                message: error,
            });
        }
    };

    let parsed = parse_search_page(&body).map_err(|message| FreshlistError::PageStructure {
        url: url.to_string(),
        message,
    })?;

    tracing::debug!(
        "Search page carries {} listing fragments (final: {})",
        parsed.fragments.len(),
        parsed.is_final_page
    );

    let semaphore = Arc::new(Semaphore::new(max_concurrent_items));
    let mut tasks: JoinSet<(usize, ExtractOutcome)> = JoinSet::new();

    for (index, fragment) in parsed.fragments.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let extractor = extractor.clone();

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("item semaphore closed");
            (index, extractor.extract(fragment).await)
        });
    }

    let mut extracted: Vec<(usize, ExtractOutcome)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => extracted.push(pair),
            Err(e) => tracing::error!("Item extraction task failed: {}", e),
        }
    }

    // Restore fragment order so records and ledger entries stay aligned
    extracted.sort_by_key(|(index, _)| *index);

    let mut outcome = PageOutcome {
        is_final_page: parsed.is_final_page,
        ..Default::default()
    };

    for (_, result) in extracted {
        match result {
            ExtractOutcome::New(record) => outcome.records.push(*record),
            ExtractOutcome::AlreadySeen => outcome.hit_already_seen = true,
            ExtractOutcome::Skipped => {}
        }
    }

    Ok(outcome)
}

/// A search page reduced to its fragments and pagination decision
#[derive(Debug)]
struct ParsedSearchPage {
    fragments: Vec<ListingFragment>,
    is_final_page: bool,
}

/// Parses a search-results page
///
/// The pagination control must exist: its absence means the page did not
/// render the expected structure, and treating that as "final page" would
/// silently truncate the crawl. A present control without an `href` marks
/// the genuine final page.
fn parse_search_page(html: &str) -> std::result::Result<ParsedSearchPage, String> {
    let document = Html::parse_document(html);

    let next_selector = Selector::parse(SELECTOR_NEXT_PAGE).map_err(|e| e.to_string())?;
    let next_control = document
        .select(&next_selector)
        .next()
        .ok_or_else(|| "pagination control not found".to_string())?;
    let is_final_page = next_control.value().attr("href").is_none();

    let wrapper_selector = Selector::parse(SELECTOR_ITEM_WRAPPER).map_err(|e| e.to_string())?;
    let link_selector = Selector::parse(SELECTOR_ITEM_LINK).map_err(|e| e.to_string())?;
    let date_selector = Selector::parse(SELECTOR_LISTING_DATE).map_err(|e| e.to_string())?;
    let price_selector = Selector::parse(SELECTOR_ITEM_PRICE).map_err(|e| e.to_string())?;

    let mut fragments = Vec::new();
    for wrapper in document
        .select(&wrapper_selector)
        .skip(LEADING_PROMO_SLOTS)
    {
        let link = match wrapper.select(&link_selector).next() {
            Some(link) => link,
            None => {
                tracing::debug!("Result slot without a listing link, skipping");
                continue;
            }
        };

        let href = match link.value().attr("href") {
            Some(href) => href,
            None => {
                tracing::debug!("Listing link without href, skipping");
                continue;
            }
        };

        fragments.push(ListingFragment {
            link_href: href.to_string(),
            title: link.text().collect::<String>(),
            listing_date: first_text(&wrapper, &date_selector),
            price_text: first_text(&wrapper, &price_selector),
        });
    }

    Ok(ParsedSearchPage {
        fragments,
        is_final_page,
    })
}

/// Trimmed text of the first element matching `selector` under `wrapper`
fn first_text(wrapper: &ElementRef, selector: &Selector) -> String {
    wrapper
        .select(selector)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}
