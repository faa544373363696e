//! Derived quote metrics.

use crate::quote::QuotePoint;

/// Percentage variation between the two most recent points of an ascending
/// series. `None` when fewer than 2 points exist; the caller skips the metric
/// for that cycle instead of faulting.
pub fn variation(series: &[QuotePoint]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let latest = series[series.len() - 1].bid;
    let previous = series[series.len() - 2].bid;
    if previous == 0.0 {
        return None;
    }
    Some((latest - previous) / previous * 100.0)
}
