//! The engine's per-cycle output bundle.

use chrono::NaiveDateTime;

use crate::quote::QuotePoint;
use crate::records::{PurchaseOrder, SalesOrder};

/// One cycle's complete output, handed to the presentation collaborator and
/// wholly replacing the previous snapshot. No history is kept beyond the
/// latest one.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Latest bid; absent when the current-quote fetch failed this cycle.
    pub bid: Option<f64>,
    /// Day-over-day variation percent; absent with fewer than 2 history
    /// points or on an invalid cycle.
    pub variation_pct: Option<f64>,
    pub history: Vec<QuotePoint>,
    pub sales: Vec<SalesOrder>,
    pub purchases: Vec<PurchaseOrder>,
    /// Business wall clock at generation time.
    pub generated_at: NaiveDateTime,
    /// False when this cycle failed to refresh (unusable history).
    pub valid: bool,
}

impl Snapshot {
    /// A degraded snapshot for a cycle whose history fetch failed. The bid is
    /// kept when the independent current-quote call succeeded.
    pub fn invalid(bid: Option<f64>, generated_at: NaiveDateTime) -> Self {
        Snapshot {
            bid,
            variation_pct: None,
            history: Vec::new(),
            sales: Vec::new(),
            purchases: Vec::new(),
            generated_at,
            valid: false,
        }
    }
}
