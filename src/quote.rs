//! Quote feed client for the AwesomeAPI-style currency endpoints.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::FeedError;

/// Bound on a single feed request.
const FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// One point of the daily history series. Timestamps arrive as UTC epoch
/// seconds and are kept as naive instants after the offset is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotePoint {
    pub timestamp: NaiveDateTime,
    pub bid: f64,
}

#[async_trait]
pub trait QuoteFeed: Send + Sync {
    /// Latest bid for the configured pair.
    async fn fetch_current(&self) -> Result<f64, FeedError>;

    /// Daily series, at most `limit` points, ascending by timestamp. The feed
    /// does not guarantee source order.
    async fn fetch_history(&self, limit: usize) -> Result<Vec<QuotePoint>, FeedError>;
}

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

pub struct AwesomeQuoteFeed {
    base_url: String,
    pair: String,
}

#[derive(Debug, Deserialize)]
struct CurrentQuote {
    bid: String,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    timestamp: i64,
    bid: String,
}

impl AwesomeQuoteFeed {
    pub fn new(base_url: &str, pair: &str) -> Self {
        AwesomeQuoteFeed {
            base_url: base_url.to_string(),
            pair: pair.to_string(),
        }
    }

    /// Response key of the pair, e.g. "USD-BRL" → "USDBRL".
    fn pair_key(&self) -> String {
        self.pair.replace('-', "")
    }

    fn parse_bid(raw: &str) -> Result<f64, FeedError> {
        let bid = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| FeedError::BadBid(raw.to_string()))?;
        if !bid.is_finite() || bid <= 0.0 {
            return Err(FeedError::BadBid(raw.to_string()));
        }
        Ok(bid)
    }
}

#[async_trait]
impl QuoteFeed for AwesomeQuoteFeed {
    async fn fetch_current(&self) -> Result<f64, FeedError> {
        let url = format!("{}/json/last/{}", self.base_url, self.pair);
        debug!("Requesting current quote from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("fxdash/0.2")
            .timeout(FEED_TIMEOUT)
            .build()?;
        let response = with_retry(|| async { client.get(&url).send().await }, 2, 500).await?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }

        let data = response.json::<HashMap<String, CurrentQuote>>().await?;
        let key = self.pair_key();
        let quote = data.get(&key).ok_or(FeedError::MissingPair(key))?;
        Self::parse_bid(&quote.bid)
    }

    async fn fetch_history(&self, limit: usize) -> Result<Vec<QuotePoint>, FeedError> {
        let url = format!("{}/json/daily/{}/{}", self.base_url, self.pair, limit);
        debug!("Requesting history series from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("fxdash/0.2")
            .timeout(FEED_TIMEOUT)
            .build()?;
        let response = with_retry(|| async { client.get(&url).send().await }, 2, 500).await?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }

        let rows = response.json::<Vec<HistoryRow>>().await?;
        if rows.is_empty() {
            return Err(FeedError::EmptyHistory);
        }

        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp = DateTime::from_timestamp(row.timestamp, 0)
                .ok_or(FeedError::BadTimestamp(row.timestamp))?
                .naive_utc();
            points.push(QuotePoint {
                timestamp,
                bid: Self::parse_bid(&row.bid)?,
            });
        }
        points.sort_by_key(|point| point.timestamp);

        debug!("Fetched {} history points", points.len());
        Ok(points)
    }
}
