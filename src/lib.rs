pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod log;
pub mod metrics;
pub mod normalize;
pub mod quote;
pub mod records;
pub mod schedule;
pub mod snapshot;
pub mod store;
pub mod ui;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::engine::{Engine, EngineConfig};
use crate::filter::{FilterHandle, FilterSpec};
use crate::quote::AwesomeQuoteFeed;
use crate::store::{JsonFileStore, RecordStore};
use crate::ui::ConsoleSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// The gated refresh loop; exits only with the process.
    Loop,
    /// A single ungated cycle, then exit.
    Once,
}

pub async fn run(config_path: Option<&str>, mode: RunMode) -> Result<()> {
    info!("FX dashboard starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::new(
        config.store.sales_path.clone(),
        config.store.purchases_path.clone(),
    ));

    // Both collections must seed the session; an unreachable store or an
    // empty collection halts before the first cycle.
    let spinner = ui::new_spinner("Loading record collections...");
    let seed = tokio::try_join!(store.load_sales(), store.load_purchases());
    spinner.finish_and_clear();
    let (sales_docs, purchase_docs) = seed?;

    let sales = records::sales_from_documents(sales_docs);
    let purchases = records::purchases_from_documents(purchase_docs);
    info!(
        sales = sales.len(),
        purchases = purchases.len(),
        "Record collections loaded"
    );

    let today = schedule::now().date_naive();
    let filters = Arc::new(FilterHandle::new(FilterSpec::allowing_all(
        &sales, &purchases, today,
    )));

    let feed = AwesomeQuoteFeed::new(&config.feed.base_url, &config.feed.pair);
    let refresh_interval = Duration::from_secs(config.refresh.interval_secs);
    let sink = ConsoleSink::new(&config.feed.pair, refresh_interval);

    let engine_config = EngineConfig {
        history_limit: config.feed.history_limit,
        refresh_interval,
        idle_interval: Duration::from_secs(config.refresh.idle_secs),
        gate_enabled: config.business_hours.enabled,
        reload_each_cycle: config.store.reload_each_cycle,
    };
    let mut engine = Engine::new(feed, sink, filters, sales, purchases, engine_config)
        .with_store(store);

    match mode {
        RunMode::Once => {
            engine.cycle().await;
        }
        RunMode::Loop => engine.run().await,
    }
    Ok(())
}
