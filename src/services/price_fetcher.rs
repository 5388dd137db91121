//! Steam Community Market price history client
//!
//! Fetches `/market/pricehistory/` for one item and turns its rows into
//! `PricePoint`s. Every request goes through the retry executor:
//! - transport errors, HTTP 429 and any other non-2xx status are retried
//! - a body that is not a JSON object is retried
//! - a missing or empty `prices` list is a valid "no trades" answer
//!
//! Rows look like `["Jul 02 2014 01: +0", 0.123, "42"]`. Rows that fail to
//! parse are dropped.

use crate::constants::PRICE_HISTORY_URL;
use crate::error::{Error, Result};
use crate::models::PricePoint;
use crate::services::backoff::{retry_with_backoff, RetryPolicy};
use crate::services::session::MarketSession;
use chrono::NaiveDateTime;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MAX_OFFSET_HOURS: i64 = 24;

/// Price history fetcher bound to one session
#[derive(Clone)]
pub struct PriceFetcher {
    session: Arc<dyn MarketSession>,
    base_url: String,
    app_id: u32,
    retry: RetryPolicy,
}

impl PriceFetcher {
    pub fn new(session: Arc<dyn MarketSession>, app_id: u32, retry: RetryPolicy) -> Self {
        Self {
            session,
            base_url: PRICE_HISTORY_URL.to_string(),
            app_id,
            retry,
        }
    }

    /// Override the endpoint (mirrors, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the price history URL for one item
    pub fn history_url(&self, item: &str) -> Result<String> {
        let app_id = self.app_id.to_string();
        let url = Url::parse_with_params(
            &self.base_url,
            &[("appid", app_id.as_str()), ("market_hash_name", item)],
        )
        .map_err(|e| Error::Config(format!("Invalid price history URL {}: {}", self.base_url, e)))?;

        Ok(url.into())
    }

    /// Fetch the full price history of one item.
    ///
    /// `Ok(vec![])` means the market reported no trades; every other problem
    /// surfaces as `Err` once retries are exhausted.
    pub async fn fetch_history(&self, item: &str) -> Result<Vec<PricePoint>> {
        let url = self.history_url(item)?;
        let label = format!("price history {}", item);

        let points = retry_with_backoff(&label, &self.retry, || self.fetch_once(&url)).await?;

        debug!(item = item, points = points.len(), "Fetched price history");
        Ok(points)
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<PricePoint>> {
        let response = self.session.get(url).await?;

        if response.status == 429 {
            return Err(Error::RateLimit);
        }

        if !response.is_success() {
            return Err(Error::HttpStatus {
                status: response.status,
                message: "price history request failed".to_string(),
            });
        }

        parse_price_history(&response.body)
    }
}

/// Parse a price history body into points.
///
/// The body must be a JSON object; its `prices` field may be absent or
/// malformed, which yields an empty list.
pub fn parse_price_history(body: &str) -> Result<Vec<PricePoint>> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("Failed to parse price history: {}", e)))?;

    if !json.is_object() {
        return Err(Error::Parse("Price history is not a JSON object".to_string()));
    }

    let rows = match json.get("prices").and_then(Value::as_array) {
        Some(rows) => rows,
        None => return Ok(Vec::new()),
    };

    let points: Vec<PricePoint> = rows.iter().filter_map(parse_row).collect();

    if points.len() < rows.len() {
        debug!(dropped = rows.len() - points.len(), "Dropped unparseable price rows");
    }

    Ok(points)
}

fn parse_row(row: &Value) -> Option<PricePoint> {
    let fields = row.as_array()?;
    if fields.len() < 3 {
        return None;
    }

    let time = parse_market_timestamp(fields[0].as_str()?)?;
    let value = fields[1]
        .as_f64()
        .or_else(|| fields[1].as_str().and_then(|s| s.trim().parse().ok()))?;
    let volume = fields[2]
        .as_u64()
        .or_else(|| fields[2].as_str().and_then(|s| s.trim().parse().ok()))?;

    if !value.is_finite() {
        return None;
    }

    Some(PricePoint::new(time, value, volume))
}

/// Parse a market timestamp such as `"Jul 02 2014 01: +0"` into epoch millis.
///
/// The market prints the hour without minutes and a trailing UTC offset in
/// whole hours. Offsets outside +-24h are rejected.
pub fn parse_market_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();

    let (datetime_part, offset_hours) = match raw.rsplit_once(' ') {
        Some((head, tail)) if tail.starts_with('+') || tail.starts_with('-') => {
            (head, tail.parse::<i64>().ok()?)
        }
        _ => (raw, 0),
    };

    let hour_text = format!("{}:00", datetime_part.trim().trim_end_matches(':'));
    let naive = NaiveDateTime::parse_from_str(&hour_text, "%b %d %Y %H:%M").ok()?;

    if !(-MAX_OFFSET_HOURS..=MAX_OFFSET_HOURS).contains(&offset_hours) {
        return None;
    }

    naive
        .and_utc()
        .timestamp_millis()
        .checked_sub(offset_hours.checked_mul(MILLIS_PER_HOUR)?)
}
