use crate::models::{PricePoint, PriceSummary};

/// Volume-weighted average price.
///
/// Falls back to the plain mean when no volume was recorded. Returns `None`
/// for an empty slice.
pub fn weighted_average(points: &[PricePoint]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }

    // Upstream volumes can sum past u64::MAX
    let total_volume: f64 = points.iter().map(|p| p.volume as f64).sum();

    if total_volume == 0.0 {
        let sum: f64 = points.iter().map(|p| p.value).sum();
        return Some(sum / points.len() as f64);
    }

    let weighted: f64 = points.iter().map(|p| p.value * p.volume as f64).sum();
    Some(weighted / total_volume)
}

/// Summarize a price history into the stored record
pub fn summarize(points: &[PricePoint]) -> Option<PriceSummary> {
    weighted_average(points).map(PriceSummary::new)
}
