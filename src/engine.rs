//! The refresh orchestrator: a sequential loop that reconciles the quote feed
//! with the session's records into one snapshot per cycle.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::filter::{FilterHandle, FilterSpec};
use crate::metrics;
use crate::quote::QuoteFeed;
use crate::records::{self, PurchaseOrder, SalesOrder};
use crate::schedule;
use crate::snapshot::Snapshot;
use crate::store::RecordStore;

/// Presentation collaborator. Receives one snapshot per cycle (with the
/// filter selection that produced it) plus human-readable fault reports.
pub trait SnapshotSink: Send + Sync {
    fn present(&self, snapshot: &Snapshot, spec: &FilterSpec);
    fn status(&self, message: &str);
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub history_limit: usize,
    /// Sleep between cycles while the gate is open.
    pub refresh_interval: Duration,
    /// Sleep between gate re-checks while closed.
    pub idle_interval: Duration,
    pub gate_enabled: bool,
    pub reload_each_cycle: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            history_limit: 100,
            refresh_interval: Duration::from_secs(60),
            idle_interval: Duration::from_secs(60),
            gate_enabled: true,
            reload_each_cycle: false,
        }
    }
}

pub struct Engine<F, S> {
    feed: F,
    sink: S,
    filters: Arc<FilterHandle>,
    store: Option<Arc<dyn RecordStore>>,
    sales: Vec<SalesOrder>,
    purchases: Vec<PurchaseOrder>,
    config: EngineConfig,
}

impl<F: QuoteFeed, S: SnapshotSink> Engine<F, S> {
    pub fn new(
        feed: F,
        sink: S,
        filters: Arc<FilterHandle>,
        sales: Vec<SalesOrder>,
        purchases: Vec<PurchaseOrder>,
        config: EngineConfig,
    ) -> Self {
        Engine {
            feed,
            sink,
            filters,
            store: None,
            sales,
            purchases,
            config,
        }
    }

    /// Attach the record store used for per-cycle reloads. Without one the
    /// startup records are held for the whole session.
    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The refresh loop. Re-evaluates the business-hours gate on every
    /// iteration and only exits with the process.
    pub async fn run(mut self) {
        loop {
            if self.config.gate_enabled && !schedule::is_open(schedule::now()) {
                debug!("Outside business hours, idling");
                tokio::time::sleep(self.config.idle_interval).await;
                continue;
            }
            self.cycle().await;
            tokio::time::sleep(self.config.refresh_interval).await;
        }
    }

    /// One full refresh cycle. Every fault is contained here and reported to
    /// the sink; the loop always reaches its next tick.
    pub async fn cycle(&mut self) -> Snapshot {
        if self.config.reload_each_cycle {
            self.reload_records().await;
        }

        // One immutable selection per cycle; concurrent widget edits land in
        // the next cycle as a whole.
        let spec = self.filters.current();

        let (current, history) = futures::join!(
            self.feed.fetch_current(),
            self.feed.fetch_history(self.config.history_limit)
        );
        let generated_at = schedule::now().naive_local();

        let bid = match current {
            Ok(bid) => Some(bid),
            Err(err) => {
                warn!(error = %err, "Current quote unavailable");
                self.sink.status(&format!("Quote fetch failed: {err}"));
                None
            }
        };

        let snapshot = match history {
            Ok(series) => Snapshot {
                bid,
                variation_pct: metrics::variation(&series),
                history: series,
                sales: spec.sales_view(&self.sales),
                purchases: spec.purchases_view(&self.purchases),
                generated_at,
                valid: true,
            },
            Err(err) => {
                warn!(error = %err, "History unavailable, snapshot degraded");
                self.sink.status(&format!("History fetch failed: {err}"));
                Snapshot::invalid(bid, generated_at)
            }
        };

        self.sink.present(&snapshot, &spec);
        snapshot
    }

    async fn reload_records(&mut self) {
        let Some(store) = &self.store else { return };

        match tokio::try_join!(store.load_sales(), store.load_purchases()) {
            Ok((sales_docs, purchase_docs)) => {
                self.sales = records::sales_from_documents(sales_docs);
                self.purchases = records::purchases_from_documents(purchase_docs);
                debug!(
                    sales = self.sales.len(),
                    purchases = self.purchases.len(),
                    "Record collections reloaded"
                );
            }
            Err(err) => {
                warn!(error = %err, "Record reload failed, keeping previous records");
                self.sink.status(&format!("Record reload failed: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::quote::QuotePoint;
    use crate::store::JsonFileStore;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate};
    use std::sync::Mutex;

    struct StubFeed {
        bid: Option<f64>,
        history: Option<Vec<QuotePoint>>,
    }

    #[async_trait]
    impl QuoteFeed for StubFeed {
        async fn fetch_current(&self) -> Result<f64, FeedError> {
            self.bid
                .ok_or(FeedError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        }

        async fn fetch_history(&self, _limit: usize) -> Result<Vec<QuotePoint>, FeedError> {
            self.history.clone().ok_or(FeedError::EmptyHistory)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        snapshots: Arc<Mutex<Vec<Snapshot>>>,
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl SnapshotSink for RecordingSink {
        fn present(&self, snapshot: &Snapshot, _spec: &FilterSpec) {
            self.snapshots.lock().unwrap().push(snapshot.clone());
        }

        fn status(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn history(bids: &[f64]) -> Vec<QuotePoint> {
        bids.iter()
            .enumerate()
            .map(|(i, bid)| QuotePoint {
                timestamp: DateTime::from_timestamp(1_700_000_000 + i as i64 * 86_400, 0)
                    .unwrap()
                    .naive_utc(),
                bid: *bid,
            })
            .collect()
    }

    fn sample_sales(date: NaiveDate) -> Vec<SalesOrder> {
        vec![SalesOrder {
            subject: "Pedido 1".to_string(),
            status: "Faturado".to_string(),
            created_at: date.and_hms_opt(9, 0, 0),
            payment_term: "30 dias".to_string(),
            child_flag: "Não".to_string(),
            quantity_sold: 10.0,
            product: "Soja".to_string(),
            date: Some(date),
        }]
    }

    fn sample_purchases(date: NaiveDate) -> Vec<PurchaseOrder> {
        vec![PurchaseOrder {
            reference: "PC-1".to_string(),
            product: "Milho".to_string(),
            quantity_paid: 5.0,
            warehouse: "Central".to_string(),
            created_at: date.and_hms_opt(10, 0, 0),
            sequence: 1,
            date: Some(date),
        }]
    }

    fn engine_with(
        feed: StubFeed,
        sink: RecordingSink,
        date: NaiveDate,
    ) -> Engine<StubFeed, RecordingSink> {
        let sales = sample_sales(date);
        let purchases = sample_purchases(date);
        let filters = Arc::new(FilterHandle::new(FilterSpec::allowing_all(
            &sales, &purchases, date,
        )));
        Engine::new(feed, sink, filters, sales, purchases, EngineConfig::default())
    }

    #[tokio::test]
    async fn test_full_cycle_builds_valid_snapshot() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let sink = RecordingSink::default();
        let feed = StubFeed {
            bid: Some(5.02),
            history: Some(history(&[5.00592, 5.01000])),
        };
        let mut engine = engine_with(feed, sink.clone(), date);

        let snapshot = engine.cycle().await;

        assert!(snapshot.valid);
        assert_eq!(snapshot.bid, Some(5.02));
        assert!(snapshot.variation_pct.unwrap() > 0.0);
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.sales.len(), 1);
        assert_eq!(snapshot.purchases.len(), 1);
        assert_eq!(sink.snapshots.lock().unwrap().len(), 1);
        assert!(sink.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_current_quote_failure_degrades_only_the_bid() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let sink = RecordingSink::default();
        let feed = StubFeed {
            bid: None,
            history: Some(history(&[5.00592, 5.01000])),
        };
        let mut engine = engine_with(feed, sink.clone(), date);

        let snapshot = engine.cycle().await;

        assert!(snapshot.valid);
        assert_eq!(snapshot.bid, None);
        assert!(snapshot.variation_pct.is_some());
        assert_eq!(snapshot.sales.len(), 1);
        let messages = sink.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Quote fetch failed"));
    }

    #[tokio::test]
    async fn test_history_failure_marks_snapshot_invalid() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let sink = RecordingSink::default();
        let feed = StubFeed {
            bid: Some(5.02),
            history: None,
        };
        let mut engine = engine_with(feed, sink.clone(), date);

        let snapshot = engine.cycle().await;

        assert!(!snapshot.valid);
        assert_eq!(snapshot.bid, Some(5.02));
        assert_eq!(snapshot.variation_pct, None);
        assert!(snapshot.history.is_empty());
        assert!(snapshot.sales.is_empty());
        assert!(snapshot.purchases.is_empty());
        assert!(
            sink.messages
                .lock()
                .unwrap()
                .iter()
                .any(|m| m.contains("History fetch failed"))
        );

        // the loop is not poisoned: the next cycle still emits
        engine.cycle().await;
        assert_eq!(sink.snapshots.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_single_point_history_leaves_variation_undefined() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let sink = RecordingSink::default();
        let feed = StubFeed {
            bid: Some(5.02),
            history: Some(history(&[5.01])),
        };
        let mut engine = engine_with(feed, sink.clone(), date);

        let snapshot = engine.cycle().await;

        assert!(snapshot.valid);
        assert_eq!(snapshot.variation_pct, None);
        // insufficient history is not a fault
        assert!(sink.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_consecutive_cycles_identical_except_generation_time() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let sink = RecordingSink::default();
        let feed = StubFeed {
            bid: Some(5.02),
            history: Some(history(&[5.00592, 5.01000])),
        };
        let mut engine = engine_with(feed, sink.clone(), date);

        let first = engine.cycle().await;
        let mut second = engine.cycle().await;
        second.generated_at = first.generated_at;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_filter_change_between_cycles_is_picked_up() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let sink = RecordingSink::default();
        let feed = StubFeed {
            bid: Some(5.02),
            history: Some(history(&[5.00592, 5.01000])),
        };
        let sales = sample_sales(date);
        let purchases = sample_purchases(date);
        let filters = Arc::new(FilterHandle::new(FilterSpec::allowing_all(
            &sales, &purchases, date,
        )));
        let mut engine = Engine::new(
            feed,
            sink.clone(),
            Arc::clone(&filters),
            sales,
            purchases,
            EngineConfig::default(),
        );

        assert_eq!(engine.cycle().await.sales.len(), 1);

        let mut spec = (*filters.current()).clone();
        spec.statuses.clear();
        filters.replace(spec);

        assert!(engine.cycle().await.sales.is_empty());
    }

    #[tokio::test]
    async fn test_reload_each_cycle_picks_up_new_documents() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let sales_path = dir.path().join("pedidos.json");
        let purchases_path = dir.path().join("ordens.json");
        let sales_body = r#"[{"Assunto": "Pedido 1", "Status": "Faturado",
            "Hora de Criação": "2024-05-03T09:00:00", "Condição de Pagamento": "30 dias",
            "Pedido Filho?": "Não", "Quantidade Total": "10", "Produtos": "Soja"}]"#;
        let purchases_body = r#"[{"Nome Produto": "Milho", "Quantidade Paga": 5,
            "Armazém": "Central", "Hora de Criação": "2024-05-03T10:00:00",
            "Pedido de Compra": "PC-1"}]"#;
        std::fs::write(&sales_path, sales_body).unwrap();
        std::fs::write(&purchases_path, purchases_body).unwrap();

        let store = Arc::new(JsonFileStore::new(
            sales_path.clone(),
            purchases_path.clone(),
        ));
        let sink = RecordingSink::default();
        let feed = StubFeed {
            bid: Some(5.02),
            history: Some(history(&[5.00592, 5.01000])),
        };
        let sales = sample_sales(date);
        let purchases = sample_purchases(date);
        let filters = Arc::new(FilterHandle::new(FilterSpec::allowing_all(
            &sales, &purchases, date,
        )));
        let config = EngineConfig {
            reload_each_cycle: true,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(feed, sink.clone(), filters, sales, purchases, config)
            .with_store(store);

        assert_eq!(engine.cycle().await.purchases.len(), 1);

        // a second purchase order appears in the store
        let two_purchases = r#"[
            {"Nome Produto": "Milho", "Quantidade Paga": 5, "Armazém": "Central",
             "Hora de Criação": "2024-05-03T10:00:00", "Pedido de Compra": "PC-1"},
            {"Nome Produto": "Trigo", "Quantidade Paga": 7, "Armazém": "Central",
             "Hora de Criação": "2024-05-03T11:00:00", "Pedido de Compra": "PC-2"}
        ]"#;
        std::fs::write(&purchases_path, two_purchases).unwrap();
        assert_eq!(engine.cycle().await.purchases.len(), 2);

        // a broken store mid-session keeps the previous records
        std::fs::remove_file(&purchases_path).unwrap();
        let snapshot = engine.cycle().await;
        assert_eq!(snapshot.purchases.len(), 2);
        assert!(
            sink.messages
                .lock()
                .unwrap()
                .iter()
                .any(|m| m.contains("Record reload failed"))
        );
    }
}
