use crate::error::{Error, Result};
use crate::models::RunConfig;
use crate::services::batch_runner::{BatchRunner, RunReport};
use crate::services::catalog::CatalogResolver;
use crate::services::price_fetcher::PriceFetcher;
use crate::services::price_store::{MergeOutcome, PriceStoreMerger};
use crate::services::session::MarketSession;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info};

/// Summary of one complete run
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub report: RunReport,
    /// `None` when the run produced no new prices and the store was left alone
    pub merge: Option<MergeOutcome>,
}

/// High-level run orchestrator: catalog -> batch runner -> price store
pub struct PriceSync {
    config: RunConfig,
    catalog_session: Arc<dyn MarketSession>,
    market_session: Arc<dyn MarketSession>,
}

impl PriceSync {
    /// `catalog_session` serves the public listings, `market_session` must be
    /// logged in to the market.
    pub fn new(
        config: RunConfig,
        catalog_session: Arc<dyn MarketSession>,
        market_session: Arc<dyn MarketSession>,
    ) -> Self {
        Self {
            config,
            catalog_session,
            market_session,
        }
    }

    /// Execute one run, measuring the time budget from now
    pub async fn run(&self) -> Result<SyncSummary> {
        self.run_from(Instant::now()).await
    }

    /// Execute one run with an explicit start instant
    pub async fn run_from(&self, started_at: Instant) -> Result<SyncSummary> {
        let resolver = CatalogResolver::new(self.config.catalog_urls.clone(), self.config.retry.clone());
        let catalog = resolver.resolve(self.catalog_session.as_ref()).await;

        if catalog.is_empty() {
            error!(
                listings = self.config.catalog_urls.len(),
                "No catalog items resolved, aborting run"
            );
            return Err(Error::EmptyCatalog);
        }

        let fetcher = PriceFetcher::new(
            self.market_session.clone(),
            self.config.app_id,
            self.config.retry.clone(),
        );
        let runner = BatchRunner::new(fetcher, &self.config);
        let outcome = runner.run(&catalog, started_at).await?;

        let merge = if outcome.results.is_empty() {
            info!("No new prices collected, price store left unchanged");
            None
        } else {
            let merger = PriceStoreMerger::new(&self.config.data_dir);
            Some(merger.merge_and_write(&outcome.results, Utc::now())?)
        };

        info!(
            elapsed_s = started_at.elapsed().as_secs(),
            succeeded = outcome.report.succeeded,
            failed = outcome.report.failed.len(),
            stopped_early = outcome.report.stopped_early,
            "Run complete"
        );

        Ok(SyncSummary {
            report: outcome.report,
            merge,
        })
    }
}
