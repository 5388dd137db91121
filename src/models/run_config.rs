use crate::constants::{
    DEFAULT_APP_ID, DEFAULT_BATCH_SIZE, DEFAULT_CATALOG_URLS, DEFAULT_MAX_DURATION_SECS,
    DEFAULT_REQUESTS_PER_MINUTE,
};
use crate::services::backoff::RetryPolicy;
use crate::utils::get_price_data_dir;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one collection run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Items fetched concurrently per batch
    pub batch_size: usize,

    /// External request ceiling; 0 disables the inter-batch sleep
    pub requests_per_minute: u32,

    /// Soft wall-clock budget checked before each batch
    pub max_duration: Duration,

    /// Retry policy shared by catalog and price requests
    pub retry: RetryPolicy,

    /// Steam app id the catalog belongs to
    pub app_id: u32,

    /// Catalog listings, resolved in order
    pub catalog_urls: Vec<String>,

    /// Directory holding the cursor, latest store and snapshots
    pub data_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            max_duration: Duration::from_secs(DEFAULT_MAX_DURATION_SECS),
            retry: RetryPolicy::default(),
            app_id: DEFAULT_APP_ID,
            catalog_urls: DEFAULT_CATALOG_URLS.iter().map(|s| s.to_string()).collect(),
            data_dir: get_price_data_dir(),
        }
    }
}

impl RunConfig {
    /// Sleep between batches: `(60_000 / rpm) * batch_size` milliseconds
    pub fn batch_delay(&self, batch_len: usize) -> Duration {
        if self.requests_per_minute == 0 {
            return Duration::ZERO;
        }
        let per_request_ms = 60_000 / self.requests_per_minute as u64;
        Duration::from_millis(per_request_ms * batch_len as u64)
    }

    /// Batch size clamped to at least one item
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
