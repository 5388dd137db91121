//! Run Defaults
//!
//! Tunables for the collection pipeline. Every value here can be overridden
//! from the command line (see `cli.rs`).
//!
//! ## Rate Budget
//!
//! The Steam Community Market tolerates roughly 20 price-history requests per
//! minute per account. The batch runner sleeps `(60_000 / rpm) * batch_size`
//! milliseconds between batches, so a batch of B concurrent requests never
//! pushes the account over that ceiling.

/// Maximum retries per remote call (total attempts = retries + 1)
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base backoff delay; attempt `n` waits `base * 2^n`
pub const DEFAULT_BASE_DELAY_MS: u64 = 5_000;

/// Items fetched concurrently per batch
pub const DEFAULT_BATCH_SIZE: usize = 1;

/// External request ceiling for the price-history endpoint
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 20;

/// Soft wall-clock budget for one run (5.7 hours).
/// Sits just under the 6h job limit of common CI schedulers.
pub const DEFAULT_MAX_DURATION_SECS: u64 = 20_520;

/// Steam app id for Counter-Strike 2
pub const DEFAULT_APP_ID: u32 = 730;

/// Price history endpoint (requires a logged-in session)
pub const PRICE_HISTORY_URL: &str = "https://steamcommunity.com/market/pricehistory/";

/// Field naming the item in every catalog listing object
pub const CATALOG_NAME_FIELD: &str = "market_hash_name";

/// Catalog listings, fetched in this order
pub const DEFAULT_CATALOG_URLS: &[&str] = &[
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/skins_not_grouped.json",
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/stickers.json",
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/crates.json",
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/keys.json",
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/agents.json",
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/patches.json",
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/graffiti.json",
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/music_kits.json",
    "https://raw.githubusercontent.com/ByMykel/CSGO-API/main/public/api/en/keychains.json",
];

/// Persisted run cursor
pub const CURSOR_FILE: &str = "state.json";

/// Canonical sorted price store
pub const LATEST_PRICES_FILE: &str = "prices_latest.json";

/// Directory holding per-run full snapshots
pub const SNAPSHOT_DIR: &str = "snapshots";
