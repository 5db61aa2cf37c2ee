//! Binance spot ticker client
//!
//! Listing only. Binance reports every trading pair, so the client keeps
//! USDT pairs and ranks them by quote volume before handing them on.

use crate::config::{FeedConfig, PING_TIMEOUT};
use crate::feed::{MarketFeed, RawPayload};
use crate::http::{top_level_array, FeedHttp};
use crate::types::{BinanceTicker, BINANCE_QUOTE_SUFFIX};
use async_trait::async_trait;
use intel_core::{FetchMode, Provider, UpstreamError};
use serde_json::Value;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Binance API client
#[derive(Clone)]
pub struct BinanceClient {
    http: FeedHttp,
    base_url: String,
    limit: usize,
}

impl BinanceClient {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            http: FeedHttp::new(Provider::Binance, config.timeout),
            base_url: config.binance_base_url.trim_end_matches('/').to_string(),
            limit: config.listing_limit,
        }
    }
}

/// Keep the `limit` most traded USDT pairs, busiest first
fn top_usdt_pairs(tickers: Vec<Value>, limit: usize) -> Vec<Value> {
    let mut pairs: Vec<(f64, Value)> = tickers
        .into_iter()
        .filter(|t| {
            t.get("symbol")
                .and_then(Value::as_str)
                .is_some_and(|s| s.ends_with(BINANCE_QUOTE_SUFFIX))
        })
        .map(|t| {
            let volume = serde_json::from_value::<BinanceTicker>(t.clone())
                .map(|ticker| ticker.quote_volume())
                .unwrap_or(0.0);
            (volume, t)
        })
        .collect();

    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    pairs.into_iter().take(limit).map(|(_, t)| t).collect()
}

#[async_trait]
impl MarketFeed for BinanceClient {
    fn provider(&self) -> Provider {
        Provider::Binance
    }

    #[instrument(skip(self))]
    async fn fetch_markets(&self, _mode: FetchMode) -> Result<RawPayload, UpstreamError> {
        let url = format!("{}/ticker/24hr", self.base_url);
        debug!("[Binance] GET {}", url);
        let start = Instant::now();

        let body = self.http.send_json(self.http.get(&url)).await?;
        let tickers = top_level_array(Provider::Binance, body)?;
        let records = top_usdt_pairs(tickers, self.limit);
        if records.is_empty() {
            return Err(UpstreamError::empty(Provider::Binance));
        }

        info!(
            "[Binance] {} USDT pairs in {}ms",
            records.len(),
            start.elapsed().as_millis()
        );
        Ok(RawPayload::new(Provider::Binance, records))
    }

    async fn ping(&self) -> Result<(), UpstreamError> {
        let request = self
            .http
            .get(&format!("{}/ping", self.base_url))
            .timeout(PING_TIMEOUT);
        self.http.probe(request).await
    }
}
