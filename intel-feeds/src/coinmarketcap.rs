//! CoinMarketCap API client

use crate::config::{FeedConfig, PING_TIMEOUT};
use crate::feed::{MarketFeed, RawPayload};
use crate::history::synthesize_daily_history;
use crate::http::{array_field, FeedHttp};
use crate::types::CmcListingEntry;
use async_trait::async_trait;
use chrono::Utc;
use intel_core::{CoinDetail, DetailMarketData, FetchMode, Provider, UpstreamError, UsdAmount};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// CoinMarketCap API client
#[derive(Clone)]
pub struct CoinMarketCapClient {
    http: FeedHttp,
    base_url: String,
    api_key: Option<String>,
    limit: usize,
}

impl CoinMarketCapClient {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            http: FeedHttp::new(Provider::CoinMarketCap, config.timeout),
            base_url: config.coinmarketcap_base_url.trim_end_matches('/').to_string(),
            api_key: config.coinmarketcap_api_key.clone(),
            limit: config.listing_limit,
        }
    }

    fn api_key(&self) -> Result<&str, UpstreamError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::missing_key(Provider::CoinMarketCap))
    }

    fn get(&self, path: &str, key: &str) -> reqwest::RequestBuilder {
        self.http
            .get(&format!("{}{}", self.base_url, path))
            .header("X-CMC_PRO_API_KEY", key)
    }

    /// Look up one quote by a single query parameter (`symbol` or `slug`)
    async fn quote_by(
        &self,
        key: &str,
        param: &str,
        value: &str,
    ) -> Result<CmcListingEntry, UpstreamError> {
        let request = self
            .get("/cryptocurrency/quotes/latest", key)
            .query(&[(param, value), ("convert", "USD")]);
        let body = self.http.send_json(request).await?;
        first_quote_entry(body)
    }
}

/// `quotes/latest` keys its `data` object by symbol or id; take the first
/// entry, unwrapping the array form returned for symbol lookups
fn first_quote_entry(body: Value) -> Result<CmcListingEntry, UpstreamError> {
    let entry = body
        .get("data")
        .and_then(Value::as_object)
        .and_then(|data| data.values().next())
        .map(|entry| match entry {
            Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        })
        .ok_or_else(|| UpstreamError::malformed(Provider::CoinMarketCap, "missing `data` object"))?;

    serde_json::from_value(entry)
        .map_err(|e| UpstreamError::malformed(Provider::CoinMarketCap, e.to_string()))
}

#[async_trait]
impl MarketFeed for CoinMarketCapClient {
    fn provider(&self) -> Provider {
        Provider::CoinMarketCap
    }

    #[instrument(skip(self))]
    async fn fetch_markets(&self, _mode: FetchMode) -> Result<RawPayload, UpstreamError> {
        let key = self.api_key()?;
        debug!("[CoinMarketCap] GET {}/cryptocurrency/listings/latest", self.base_url);
        let start = Instant::now();

        let request = self.get("/cryptocurrency/listings/latest", key).query(&[
            ("start", "1".to_string()),
            ("limit", self.limit.to_string()),
            ("convert", "USD".to_string()),
            ("sort", "market_cap".to_string()),
            ("sort_dir", "desc".to_string()),
        ]);
        let body = self.http.send_json(request).await?;
        let records = array_field(Provider::CoinMarketCap, body, "data")?;

        info!(
            "[CoinMarketCap] {} coins in {}ms",
            records.len(),
            start.elapsed().as_millis()
        );
        Ok(RawPayload::new(Provider::CoinMarketCap, records))
    }

    #[instrument(skip(self))]
    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, UpstreamError> {
        let key = self.api_key()?;

        let entry = match self.quote_by(key, "symbol", &id.to_uppercase()).await {
            Ok(entry) => entry,
            Err(e) => {
                debug!("[CoinMarketCap] symbol lookup for {} failed ({}), trying slug", id, e);
                self.quote_by(key, "slug", &id.to_lowercase()).await?
            }
        };

        let quote = entry
            .usd()
            .cloned()
            .ok_or_else(|| UpstreamError::malformed(Provider::CoinMarketCap, "no USD quote"))?;
        let price = quote
            .price
            .filter(|p| *p > 0.0)
            .ok_or_else(|| UpstreamError::empty(Provider::CoinMarketCap))?;
        let change = quote.percent_change_24h.unwrap_or(0.0);
        let volume = quote.volume_24h.unwrap_or(0.0);

        let (prices, volumes) =
            synthesize_daily_history(price, change, volume, Utc::now().timestamp_millis());

        let market_data = DetailMarketData {
            current_price: UsdAmount::new(price),
            market_cap: UsdAmount::new(quote.market_cap.unwrap_or(0.0)),
            total_volume: UsdAmount::new(volume),
            price_change_percentage_24h: change,
            high_24h: UsdAmount::new(quote.high_24h.unwrap_or(price)),
            low_24h: UsdAmount::new(quote.low_24h.unwrap_or(price)),
            circulating_supply: entry.circulating_supply.unwrap_or(0.0),
            total_supply: entry.total_supply.unwrap_or(0.0),
        };

        Ok(CoinDetail::new(
            entry.id(),
            entry.symbol.clone(),
            entry.name.clone(),
            "",
            market_data,
            prices,
            volumes,
        ))
    }

    async fn ping(&self) -> Result<(), UpstreamError> {
        let key = self.api_key()?;
        let request = self.get("/key/info", key).timeout(PING_TIMEOUT);
        self.http.probe(request).await
    }
}
