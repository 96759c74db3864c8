//! Crawl controller
//!
//! Drives the pagination loop: successive search pages are fetched and
//! fully processed, one at a time, until the feed reports its final page or
//! any fragment resolves to an already-known identifier. Pages are assumed
//! roughly reverse-chronological, so one known item means every later page
//! is fully known.
//!
//! The controller owns all per-run state. Records and their ledger entries
//! are appended pairwise, so they hold equal cardinality and matching order
//! at finalize time by construction.

use crate::config::Config;
use crate::crawler::extractor::{ItemExtractor, ItemRecord};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::gate::DedupGate;
use crate::crawler::page::{process_search_page, search_page_url};
use crate::export::{CsvExporter, ExportSink};
use crate::ledger::{Ledger, LedgerEntry, RunStatus, SqliteLedger};
use crate::Result;
use chrono::Local;
use reqwest::Client;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Summary of a finished harvest run
#[derive(Debug)]
pub struct RunReport {
    /// Number of newly collected items
    pub new_items: usize,

    /// Search pages visited before termination
    pub pages_visited: u32,

    /// Path of the export artifact, when anything was collected
    pub export_path: Option<PathBuf>,

    /// True when the run was cut short by a shutdown request
    pub partial: bool,

    /// The collected records, in collection order
    pub records: Vec<ItemRecord>,
}

/// Per-run accumulator state, owned exclusively by the controller
#[derive(Debug, Default)]
struct RunState {
    page_number: u32,
    records: Vec<ItemRecord>,
    new_entries: Vec<LedgerEntry>,
    partial: bool,
}

/// Drives the pagination loop and finalizes the ledger and export
pub struct Controller {
    config: Arc<Config>,
    client: Client,
    ledger: SqliteLedger,
    gate: Arc<DedupGate>,
    run_id: i64,
    run_label: String,
}

impl Controller {
    /// Opens the ledger, loads the seen-item snapshot and registers the run
    ///
    /// A ledger that cannot be read is fatal here: without the snapshot,
    /// every listing would look new and the run would re-collect the world.
    pub fn new(config: Config, config_hash: &str) -> Result<Self> {
        let mut ledger = SqliteLedger::new(Path::new(&config.output.ledger_path))?;

        let snapshot = ledger.load_seen()?;
        tracing::info!("Loaded {} previously seen identifiers", snapshot.len());

        let run_id = ledger.create_run(config_hash)?;
        let run_label = Local::now().format("%Y-%m-%d__%H-%M-%S").to_string();
        let client = build_http_client(&config.client)?;

        Ok(Self {
            config: Arc::new(config),
            client,
            ledger,
            gate: Arc::new(DedupGate::new(snapshot)),
            run_id,
            run_label,
        })
    }

    /// Runs the crawl until a termination condition fires or `shutdown`
    /// resolves
    ///
    /// Shutdown abandons the in-flight page (its worker tasks are aborted
    /// when the page future drops) and finalizes only fully-completed
    /// pages, so a half-finished page's identifiers never reach the ledger.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> Result<RunReport> {
        tokio::pin!(shutdown);

        let extractor = ItemExtractor::new(self.client.clone(), Arc::clone(&self.gate));
        let max_concurrent = self.config.client.max_concurrent_items as usize;
        let today = Local::now().format("%d-%m-%Y").to_string();

        let mut state = RunState {
            page_number: 1,
            ..Default::default()
        };

        loop {
            let url = search_page_url(&self.config, state.page_number)?;
            tracing::info!("Fetching search page {}", state.page_number);

            // The select only yields a value; ledger access happens after
            // the page future (and its borrows) are dropped.
            let step = tokio::select! {
                outcome = process_search_page(&self.client, &extractor, &url, max_concurrent) => {
                    Some(outcome)
                }
                _ = &mut shutdown => None,
            };

            let page = match step {
                Some(Ok(page)) => page,
                Some(Err(e)) => {
                    // An unreachable or malformed search feed aborts the
                    // whole run; nothing reaches the ledger.
                    tracing::error!("Aborting run: {}", e);
                    self.ledger.finish_run(self.run_id, RunStatus::Failed, 0)?;
                    return Err(e);
                }
                None => {
                    tracing::warn!(
                        "Shutdown requested, abandoning page {}",
                        state.page_number
                    );
                    state.partial = true;
                    break;
                }
            };

            tracing::info!(
                "Page {}: {} new records (already seen: {}, final: {})",
                state.page_number,
                page.records.len(),
                page.hit_already_seen,
                page.is_final_page
            );

            for record in page.records {
                state.new_entries.push(LedgerEntry {
                    identifier: record.identifier.clone(),
                    first_seen: today.clone(),
                    url: record.url.clone(),
                });
                state.records.push(record);
            }

            if page.is_final_page {
                tracing::info!("Final page reached at page {}", state.page_number);
                break;
            }
            if page.hit_already_seen {
                tracing::info!(
                    "Known listing encountered on page {}, stopping",
                    state.page_number
                );
                break;
            }

            state.page_number += 1;
        }

        self.finalize(state)
    }

    /// Commits newly-seen identifiers, then exports the batch
    ///
    /// Commit failure discards the batch: a record must never be exported
    /// without its identifier in the ledger, or it would be re-collected as
    /// "new" on every future run.
    fn finalize(&mut self, state: RunState) -> Result<RunReport> {
        debug_assert_eq!(state.records.len(), state.new_entries.len());

        if let Err(e) = self.ledger.commit(&state.new_entries) {
            tracing::error!(
                "Ledger commit failed, discarding {} collected records: {}",
                state.records.len(),
                e
            );
            self.ledger.finish_run(self.run_id, RunStatus::Failed, 0)?;
            return Err(e.into());
        }

        let export_path = if state.records.is_empty() {
            tracing::info!("No new items found in search");
            None
        } else {
            let exporter = CsvExporter::new(&self.config.output.export_dir);
            let path = exporter.export(&state.records, &self.run_label)?;
            tracing::info!(
                "{} items exported to {}",
                state.records.len(),
                path.display()
            );
            Some(path)
        };

        let status = if state.partial {
            RunStatus::Partial
        } else {
            RunStatus::Completed
        };
        self.ledger
            .finish_run(self.run_id, status, state.records.len() as u32)?;

        Ok(RunReport {
            new_items: state.records.len(),
            pages_visited: state.page_number,
            export_path,
            partial: state.partial,
            records: state.records,
        })
    }
}
