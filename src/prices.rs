//! Daily price sourcing
//!
//! Tries the live daily-price feed for a code and falls back to the locally
//! bundled snapshot whenever the feed fails or returns too little history.

use crate::config::FeedCfg;
use crate::stocks::{PriceSeries, MIN_SCORING_POINTS};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// A feed response with fewer data rows than this is treated as a failure.
pub const MIN_FEED_ROWS: usize = 30;

/// Column holding the close in `Date,Open,High,Low,Close,Volume` rows.
const CLOSE_COLUMN: usize = 4;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request for {code} failed: {source}")]
    Transport {
        code: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("price feed returned {status} for {code}")]
    Status { code: String, status: StatusCode },

    #[error("not enough data for {code}: {rows} rows")]
    InsufficientRows { code: String, rows: usize },

    #[error("live feed disabled")]
    Offline,
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Daily closes for `code`, oldest first.
    async fn daily_closes(&self, code: &str) -> Result<Vec<f64>, FeedError>;
}

/// Parse a CSV daily-history body into closing prices.
///
/// The first line is a header. Rows whose close does not parse to a positive
/// finite number are skipped.
pub fn parse_daily_closes(code: &str, body: &str) -> Result<Vec<f64>, FeedError> {
    let mut lines = body.trim().lines();
    let header = lines.next();
    let rows: Vec<&str> = lines.collect();

    if header.is_none() || rows.len() < MIN_FEED_ROWS {
        return Err(FeedError::InsufficientRows {
            code: code.to_string(),
            rows: rows.len(),
        });
    }

    Ok(rows
        .iter()
        .filter_map(|row| row.split(',').nth(CLOSE_COLUMN))
        .filter_map(|close| close.trim().parse::<f64>().ok())
        .filter(|close| close.is_finite() && *close > 0.0)
        .collect())
}

/// Stooq CSV download endpoint.
pub struct StooqFeed {
    client: Client,
    cfg: FeedCfg,
}

impl StooqFeed {
    pub fn new(cfg: FeedCfg) -> crate::error::Result<Self> {
        let client = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout())
            .build()?;
        Ok(Self { client, cfg })
    }

    fn symbol(&self, code: &str) -> String {
        format!("{}.{}", code.to_lowercase(), self.cfg.exchange_suffix)
    }
}

#[async_trait]
impl PriceFeed for StooqFeed {
    async fn daily_closes(&self, code: &str) -> Result<Vec<f64>, FeedError> {
        let transport = |source: reqwest::Error| FeedError::Transport {
            code: code.to_string(),
            source,
        };

        let resp = self
            .client
            .get(&self.cfg.base_url)
            .query(&[("s", self.symbol(code).as_str()), ("i", "d")])
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                code: code.to_string(),
                status,
            });
        }

        let body = resp.text().await.map_err(transport)?;
        parse_daily_closes(code, &body)
    }
}

/// Feed that never answers, so every code resolves to its fallback snapshot.
pub struct OfflineFeed;

#[async_trait]
impl PriceFeed for OfflineFeed {
    async fn daily_closes(&self, _code: &str) -> Result<Vec<f64>, FeedError> {
        Err(FeedError::Offline)
    }
}

/// Resolves a code to a price series, live when possible.
///
/// `resolve` never fails: every problem ends in the fallback snapshot, which
/// may be empty when none is registered for the code.
#[derive(Clone)]
pub struct PriceResolver {
    feed: Arc<dyn PriceFeed>,
    fallback: Arc<HashMap<String, Vec<f64>>>,
}

impl PriceResolver {
    pub fn new(feed: Arc<dyn PriceFeed>, fallback: HashMap<String, Vec<f64>>) -> Self {
        Self {
            feed,
            fallback: Arc::new(fallback),
        }
    }

    pub async fn resolve(&self, code: &str) -> PriceSeries {
        match self.feed.daily_closes(code).await {
            Ok(prices) if prices.len() >= MIN_SCORING_POINTS => {
                debug!(code = %code, points = prices.len(), "using live prices");
                return PriceSeries::live(prices);
            }
            Ok(prices) => {
                debug!(code = %code, points = prices.len(), "live series too short, using fallback");
            }
            Err(FeedError::Offline) => {}
            Err(e) => {
                warn!(code = %code, error = %e, "price feed failed, using fallback");
            }
        }

        PriceSeries::fallback(self.fallback.get(code).cloned().unwrap_or_default())
    }
}
