//! Checkpointed batch runner
//!
//! Drives the catalog through the price fetcher:
//! 1. resume at `lastIndex mod len` from the persisted cursor
//! 2. per batch: check the time budget, fetch all items concurrently, fold
//!    the outcomes into `RunState`, persist the cursor, sleep for the rate
//!    ceiling
//! 3. if the loop finished, retry every failed item once more, one at a time
//!
//! A killed process loses at most the batch that was in flight; those items
//! are fetched again by the next run.

use crate::error::{Error, Result};
use crate::models::{get_cursor_path, PriceMap, PriceSummary, RunConfig, RunCursor};
use crate::services::aggregator::summarize;
use crate::services::price_fetcher::PriceFetcher;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Outcome of fetching one item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// History fetched and summarized
    Priced(String, PriceSummary),
    /// Request succeeded but the market reported no trades
    Empty(String),
    /// Retries exhausted
    Failed(String, String),
}

/// Items that did not yield a summary, in first-failure order
#[derive(Debug, Clone, Default)]
pub struct FailureSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl FailureSet {
    pub fn insert(&mut self, item: String) -> bool {
        if self.seen.insert(item.clone()) {
            self.order.push(item);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, item: &str) {
        if self.seen.remove(item) {
            self.order.retain(|i| i != item);
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.seen.contains(item)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn items(&self) -> &[String] {
        &self.order
    }

    /// Drain the set, leaving it empty
    pub fn take(&mut self) -> Vec<String> {
        self.seen.clear();
        std::mem::take(&mut self.order)
    }
}

/// Everything a run has collected so far
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub results: PriceMap,
    pub failures: FailureSet,
}

impl RunState {
    /// Fold one settled batch into the state
    pub fn apply_batch(mut self, outcomes: Vec<ItemOutcome>) -> Self {
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Priced(item, summary) => {
                    self.failures.remove(&item);
                    self.results.insert(item, summary);
                }
                ItemOutcome::Empty(item) | ItemOutcome::Failed(item, _) => {
                    self.failures.insert(item);
                }
            }
        }
        self
    }
}

/// Informational counters of one run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub catalog_items: usize,
    pub start_index: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub retried: usize,
    pub failed: Vec<String>,
    pub stopped_early: bool,
    pub next_cursor: usize,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub results: PriceMap,
    pub report: RunReport,
}

/// Cursor value after consuming `consumed` items from `start`
pub fn cursor_after(start: usize, consumed: usize, catalog_len: usize) -> usize {
    if catalog_len == 0 {
        0
    } else {
        (start + consumed) % catalog_len
    }
}

pub struct BatchRunner {
    fetcher: PriceFetcher,
    batch_size: usize,
    config: RunConfig,
    cursor_path: PathBuf,
}

impl BatchRunner {
    pub fn new(fetcher: PriceFetcher, config: &RunConfig) -> Self {
        Self {
            fetcher,
            batch_size: config.effective_batch_size(),
            config: config.clone(),
            cursor_path: get_cursor_path(&config.data_dir),
        }
    }

    /// Run one pass over the catalog.
    ///
    /// `started_at` is the run start; the time budget is measured from it.
    pub async fn run(&self, catalog: &[String], started_at: Instant) -> Result<RunOutcome> {
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        let catalog_len = catalog.len();
        let start = RunCursor::load(&self.cursor_path).start_for(catalog_len);
        let batches: Vec<&[String]> = catalog[start..].chunks(self.batch_size).collect();
        let total_batches = batches.len();

        info!(
            catalog_items = catalog_len,
            start_index = start,
            batch_size = self.batch_size,
            total_batches = total_batches,
            "Starting batch run"
        );

        let mut state = RunState::default();
        let mut report = RunReport {
            catalog_items: catalog_len,
            start_index: start,
            next_cursor: start,
            ..RunReport::default()
        };
        let mut consumed = 0usize;

        for (batch_idx, batch) in batches.iter().enumerate() {
            if started_at.elapsed() >= self.config.max_duration {
                report.next_cursor = cursor_after(start, consumed, catalog_len);
                self.save_cursor(report.next_cursor);
                report.stopped_early = true;
                warn!(
                    elapsed_s = started_at.elapsed().as_secs(),
                    budget_s = self.config.max_duration.as_secs(),
                    next_cursor = report.next_cursor,
                    remaining_batches = total_batches - batch_idx,
                    "Time budget reached, stopping early"
                );
                break;
            }

            let outcomes = self.fetch_batch(batch).await;
            state = state.apply_batch(outcomes);

            consumed += batch.len();
            report.processed += batch.len();
            report.next_cursor = cursor_after(start, consumed, catalog_len);
            self.save_cursor(report.next_cursor);

            if batch_idx == 0 || batch_idx + 1 == total_batches || (batch_idx + 1) % 100 == 0 {
                info!(
                    batch_num = batch_idx + 1,
                    total_batches = total_batches,
                    succeeded = state.results.len(),
                    failed = state.failures.len(),
                    cursor = report.next_cursor,
                    "Batch completed"
                );
            }

            if batch_idx + 1 < total_batches {
                sleep(self.config.batch_delay(batch.len())).await;
            }
        }

        if !report.stopped_early && !state.failures.is_empty() {
            let pending = state.failures.take();
            report.retried = pending.len();
            info!(count = pending.len(), "Second pass over failed items");

            for item in &pending {
                sleep(self.config.batch_delay(1)).await;
                let outcome = self.fetch_item(item).await;
                state = state.apply_batch(vec![outcome]);
            }
        }

        report.succeeded = state.results.len();
        report.failed = state.failures.items().to_vec();

        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            stopped_early = report.stopped_early,
            next_cursor = report.next_cursor,
            "Batch run finished"
        );

        Ok(RunOutcome {
            results: state.results,
            report,
        })
    }

    async fn fetch_batch(&self, batch: &[String]) -> Vec<ItemOutcome> {
        join_all(batch.iter().map(|item| self.fetch_item(item))).await
    }

    async fn fetch_item(&self, item: &str) -> ItemOutcome {
        match self.fetcher.fetch_history(item).await {
            Ok(points) => match summarize(&points) {
                Some(summary) => {
                    debug!(item = item, points = points.len(), steam = summary.steam, "Priced item");
                    ItemOutcome::Priced(item.to_string(), summary)
                }
                None => {
                    debug!(item = item, "No price history");
                    ItemOutcome::Empty(item.to_string())
                }
            },
            Err(e) => {
                warn!(item = item, error = %e, "Failed to fetch price history");
                ItemOutcome::Failed(item.to_string(), e.to_string())
            }
        }
    }

    fn save_cursor(&self, last_index: usize) {
        // A lost checkpoint only costs re-fetching; keep the run going
        if let Err(e) = RunCursor::new(last_index).save(&self.cursor_path) {
            error!(
                path = %self.cursor_path.display(),
                error = %e,
                "Failed to persist run cursor"
            );
        }
    }
}
