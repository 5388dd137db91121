use crate::constants::CATALOG_NAME_FIELD;
use crate::error::{Error, Result};
use crate::services::backoff::{retry_with_backoff, RetryPolicy};
use crate::services::session::MarketSession;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Resolves the item catalog from a fixed list of listing endpoints
pub struct CatalogResolver {
    urls: Vec<String>,
    retry: RetryPolicy,
}

impl CatalogResolver {
    pub fn new(urls: Vec<String>, retry: RetryPolicy) -> Self {
        Self { urls, retry }
    }

    /// De-duplicated union of every listing, in listing order.
    ///
    /// A listing that still fails after its retries is skipped; the rest are
    /// kept. Returns an empty list only if nothing could be resolved, which the
    /// caller must treat as fatal.
    pub async fn resolve(&self, session: &dyn MarketSession) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let mut failed_listings = 0usize;

        for url in &self.urls {
            let label = format!("catalog {}", url);
            let listing = retry_with_backoff(&label, &self.retry, || fetch_listing(session, url)).await;

            match listing {
                Ok(names) => {
                    let total = names.len();
                    let mut added = 0usize;
                    for name in names {
                        if seen.insert(name.clone()) {
                            items.push(name);
                            added += 1;
                        }
                    }
                    info!(url = %url, total = total, added = added, "Resolved catalog listing");
                }
                Err(e) => {
                    failed_listings += 1;
                    warn!(url = %url, error = %e, "Skipping catalog listing after retries");
                }
            }
        }

        info!(
            items = items.len(),
            listings = self.urls.len(),
            failed_listings = failed_listings,
            "Catalog resolved"
        );

        items
    }
}

async fn fetch_listing(session: &dyn MarketSession, url: &str) -> Result<Vec<String>> {
    let response = session.get(url).await?;

    if !response.is_success() {
        return Err(Error::HttpStatus {
            status: response.status,
            message: format!("catalog listing {}", url),
        });
    }

    parse_listing(&response.body)
}

/// Extract item names from a listing body (a JSON array of objects)
pub fn parse_listing(body: &str) -> Result<Vec<String>> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("Failed to parse catalog listing: {}", e)))?;

    let entries = json
        .as_array()
        .ok_or_else(|| Error::Parse("Catalog listing is not a JSON array".to_string()))?;

    let names: Vec<String> = entries
        .iter()
        .filter_map(|entry| entry.get(CATALOG_NAME_FIELD).and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    if names.len() < entries.len() {
        debug!(
            skipped = entries.len() - names.len(),
            "Catalog entries without a name were ignored"
        );
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session::testing::{Reply, ScriptedSession};
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    #[test]
    fn test_parse_listing_skips_unnamed_entries() {
        let body = r#"[
            {"market_hash_name": "AK-47 | Redline (Field-Tested)"},
            {"name": "no market name"},
            {"market_hash_name": 12},
            {"market_hash_name": "Sticker | Crown (Foil)"}
        ]"#;

        let names = parse_listing(body).unwrap();
        assert_eq!(
            names,
            vec!["AK-47 | Redline (Field-Tested)", "Sticker | Crown (Foil)"]
        );
    }

    #[test]
    fn test_parse_listing_rejects_non_array() {
        assert!(parse_listing(r#"{"market_hash_name": "x"}"#).is_err());
        assert!(parse_listing("<html>").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_concatenates_and_dedupes() {
        let session = ScriptedSession::new()
            .route("/skins", vec![Reply::ok(r#"[{"market_hash_name":"a"},{"market_hash_name":"b"}]"#)])
            .route("/cases", vec![Reply::ok(r#"[{"market_hash_name":"b"},{"market_hash_name":"c"}]"#)]);
        let resolver = CatalogResolver::new(
            vec!["https://x/skins".to_string(), "https://x/cases".to_string()],
            fast_retry(),
        );

        let items = resolver.resolve(&session).await;
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failing_listing_is_skipped() {
        let session = ScriptedSession::new()
            .route("/skins", vec![Reply::ok(r#"[{"market_hash_name":"a"}]"#)])
            .route("/broken", vec![Reply::Status(500, "oops".to_string())])
            .route("/cases", vec![Reply::ok(r#"[{"market_hash_name":"c"}]"#)]);
        let resolver = CatalogResolver::new(
            vec![
                "https://x/skins".to_string(),
                "https://x/broken".to_string(),
                "https://x/cases".to_string(),
            ],
            fast_retry(),
        );

        let items = resolver.resolve(&session).await;
        assert_eq!(items, vec!["a", "c"]);
        // 1 attempt + 2 retries
        assert_eq!(session.calls_matching("/broken"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_recovers_after_transport_error() {
        let session = ScriptedSession::new().route(
            "/skins",
            vec![Reply::TransportError, Reply::ok(r#"[{"market_hash_name":"a"}]"#)],
        );
        let resolver = CatalogResolver::new(vec!["https://x/skins".to_string()], fast_retry());

        assert_eq!(resolver.resolve(&session).await, vec!["a"]);
        assert_eq!(session.calls_matching("/skins"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_listings_failing_yields_empty() {
        let session = ScriptedSession::new().route("/", vec![Reply::TransportError]);
        let resolver = CatalogResolver::new(
            vec!["https://x/skins".to_string(), "https://x/cases".to_string()],
            fast_retry(),
        );

        assert!(resolver.resolve(&session).await.is_empty());
    }
}
