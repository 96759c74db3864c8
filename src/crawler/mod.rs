//! Crawl pipeline
//!
//! This module contains the harvesting logic, including:
//! - HTTP fetching and outcome classification
//! - Search page parsing and pagination decisions
//! - Per-item deduplication and detail enrichment
//! - Overall crawl control and run finalization

mod controller;
mod extractor;
mod fetcher;
mod gate;
mod page;

pub use controller::{Controller, RunReport};
pub use extractor::{ExtractOutcome, ItemExtractor, ItemRecord, ListingFragment};
pub use fetcher::{build_http_client, fetch_url, FetchOutcome};
pub use gate::DedupGate;
pub use page::{process_search_page, search_page_url, PageOutcome};

use crate::config::Config;
use crate::Result;
use std::future::Future;

/// Runs a complete harvest operation
///
/// This is the main entry point for starting a run. It will:
/// 1. Open the ledger and load the seen-item snapshot
/// 2. Register the run and build the HTTP client
/// 3. Walk search pages until a termination condition fires
/// 4. Commit newly-seen identifiers and export the batch
///
/// `shutdown` is polled between page fetches; when it resolves, the run
/// finalizes with only fully-completed pages and is reported partial.
pub async fn run_harvest(
    config: Config,
    config_hash: &str,
    shutdown: impl Future<Output = ()>,
) -> Result<RunReport> {
    let mut controller = Controller::new(config, config_hash)?;
    controller.run(shutdown).await
}
