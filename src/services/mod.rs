pub mod aggregator;
pub mod backoff;
pub mod batch_runner;
pub mod catalog;
pub mod price_fetcher;
pub mod price_store;
pub mod price_sync;
pub mod session;

pub use aggregator::{summarize, weighted_average};
pub use backoff::{retry_with_backoff, RetryPolicy};
pub use batch_runner::{BatchRunner, FailureSet, ItemOutcome, RunOutcome, RunReport, RunState};
pub use catalog::CatalogResolver;
pub use price_fetcher::PriceFetcher;
pub use price_store::{merge, MergeOutcome, PriceStoreMerger};
pub use price_sync::{PriceSync, SyncSummary};
pub use session::{HttpResponse, HttpSession, MarketSession};
