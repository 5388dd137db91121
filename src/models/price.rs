use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One row of upstream price history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Epoch milliseconds (UTC)
    pub time: i64,

    /// Median sale price for the hour
    pub value: f64,

    /// Units sold in the hour
    pub volume: u64,
}

impl PricePoint {
    pub fn new(time: i64, value: f64, volume: u64) -> Self {
        Self { time, value, volume }
    }
}

/// Stored summary for one item.
///
/// Kept as a record rather than a bare number so further price sources can be
/// added as new fields without breaking files already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// Volume-weighted average of the Steam Community Market history
    pub steam: f64,
}

impl PriceSummary {
    pub fn new(steam: f64) -> Self {
        Self { steam }
    }
}

/// Results of one run (market hash name -> summary)
pub type PriceMap = HashMap<String, PriceSummary>;

/// Persisted price store; `BTreeMap` keeps keys in ascending order on disk
pub type PriceStore = BTreeMap<String, PriceSummary>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_summary_json_shape() {
        let json = serde_json::to_string(&PriceSummary::new(1.5)).unwrap();
        assert_eq!(json, r#"{"steam":1.5}"#);
    }

    #[test]
    fn test_price_store_serializes_sorted() {
        let mut store = PriceStore::new();
        store.insert("b".to_string(), PriceSummary::new(2.0));
        store.insert("a".to_string(), PriceSummary::new(1.0));

        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"a":{"steam":1.0},"b":{"steam":2.0}}"#);
    }
}
