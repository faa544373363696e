//! User-selected filters applied to the normalized record sets.

use arc_swap::ArcSwap;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::records::{PurchaseOrder, SalesOrder};

/// One cycle's complete filter selection: a single exact-match date plus an
/// allowed-value set per categorical dimension. A record passes only if every
/// dimension accepts it; an empty allowed set accepts nothing, mirroring the
/// selection widgets (deselecting every option empties the view).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub date: NaiveDate,
    pub payment_terms: BTreeSet<String>,
    pub child_flags: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub warehouses: BTreeSet<String>,
}

fn distinct<'a, I>(values: I) -> BTreeSet<String>
where
    I: Iterator<Item = &'a str>,
{
    values
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

impl FilterSpec {
    /// The default selection: every distinct non-empty value observed in the
    /// loaded records is allowed, matching how the selection widgets
    /// initialize.
    pub fn allowing_all(
        sales: &[SalesOrder],
        purchases: &[PurchaseOrder],
        date: NaiveDate,
    ) -> Self {
        FilterSpec {
            date,
            payment_terms: distinct(sales.iter().map(|o| o.payment_term.as_str())),
            child_flags: distinct(sales.iter().map(|o| o.child_flag.as_str())),
            statuses: distinct(sales.iter().map(|o| o.status.as_str())),
            warehouses: distinct(purchases.iter().map(|o| o.warehouse.as_str())),
        }
    }

    pub fn sales_view(&self, orders: &[SalesOrder]) -> Vec<SalesOrder> {
        orders
            .iter()
            .filter(|order| {
                order.date == Some(self.date)
                    && self.payment_terms.contains(&order.payment_term)
                    && self.child_flags.contains(&order.child_flag)
                    && self.statuses.contains(&order.status)
            })
            .cloned()
            .collect()
    }

    pub fn purchases_view(&self, orders: &[PurchaseOrder]) -> Vec<PurchaseOrder> {
        orders
            .iter()
            .filter(|order| {
                order.date == Some(self.date) && self.warehouses.contains(&order.warehouse)
            })
            .cloned()
            .collect()
    }
}

/// Shared handle to the active filter specification. The presentation layer
/// may replace the whole spec at any time; the engine loads it exactly once
/// per cycle and works from that immutable value, so a cycle never observes a
/// half-updated selection.
pub struct FilterHandle {
    inner: ArcSwap<FilterSpec>,
}

impl FilterHandle {
    pub fn new(spec: FilterSpec) -> Self {
        FilterHandle {
            inner: ArcSwap::from_pointee(spec),
        }
    }

    pub fn current(&self) -> Arc<FilterSpec> {
        self.inner.load_full()
    }

    pub fn replace(&self, spec: FilterSpec) {
        self.inner.store(Arc::new(spec));
    }
}
