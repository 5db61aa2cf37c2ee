//! CoinCap API client

use crate::config::{FeedConfig, PING_TIMEOUT};
use crate::feed::{MarketFeed, RawPayload};
use crate::history::HISTORY_DAYS;
use crate::http::{array_field, parse_num, FeedHttp};
use crate::types::CoinCapAsset;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use intel_core::{CoinDetail, DetailMarketData, FetchMode, Provider, SeriesPoint, UpstreamError, UsdAmount};
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPoint {
    #[serde(default)]
    price_usd: Option<String>,
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

impl HistoryPoint {
    fn timestamp_ms(&self) -> Option<i64> {
        self.time.or_else(|| self.date.map(|d| d.timestamp_millis()))
    }
}

/// CoinCap API client
#[derive(Clone)]
pub struct CoinCapClient {
    http: FeedHttp,
    base_url: String,
    limit: usize,
}

impl CoinCapClient {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            http: FeedHttp::new(Provider::CoinCap, config.timeout),
            base_url: config.coincap_base_url.trim_end_matches('/').to_string(),
            limit: config.listing_limit,
        }
    }

    /// Hourly prices over the detail window
    async fn fetch_history(&self, id: &str) -> Result<Vec<SeriesPoint>, UpstreamError> {
        let end = Utc::now();
        let start = end - Duration::days(HISTORY_DAYS as i64);
        let request = self
            .http
            .get(&format!("{}/assets/{}/history", self.base_url, id))
            .query(&[
                ("interval", "h1".to_string()),
                ("start", start.timestamp_millis().to_string()),
                ("end", end.timestamp_millis().to_string()),
            ]);

        let body = self.http.send_json(request).await?;
        let points = array_field(Provider::CoinCap, body, "data")?;

        Ok(points
            .into_iter()
            .filter_map(|p| serde_json::from_value::<HistoryPoint>(p).ok())
            .filter_map(|p| Some((p.timestamp_ms()?, parse_num(&p.price_usd)?)))
            .collect())
    }
}

#[async_trait]
impl MarketFeed for CoinCapClient {
    fn provider(&self) -> Provider {
        Provider::CoinCap
    }

    #[instrument(skip(self))]
    async fn fetch_markets(&self, _mode: FetchMode) -> Result<RawPayload, UpstreamError> {
        let url = format!("{}/assets", self.base_url);
        debug!("[CoinCap] GET {}", url);
        let start = Instant::now();

        let request = self
            .http
            .get(&url)
            .query(&[("limit", self.limit.to_string())]);
        let body = self.http.send_json(request).await?;
        let records = array_field(Provider::CoinCap, body, "data")?;

        info!(
            "[CoinCap] {} coins in {}ms",
            records.len(),
            start.elapsed().as_millis()
        );
        Ok(RawPayload::new(Provider::CoinCap, records))
    }

    #[instrument(skip(self))]
    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, UpstreamError> {
        let request = self.http.get(&format!("{}/assets/{}", self.base_url, id));
        let body = self.http.send_json(request).await?;

        let asset: CoinCapAsset = body
            .get("data")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| UpstreamError::malformed(Provider::CoinCap, e.to_string()))?
            .ok_or_else(|| UpstreamError::malformed(Provider::CoinCap, "missing `data` object"))?;

        let price = asset
            .price()
            .filter(|p| *p > 0.0)
            .ok_or_else(|| UpstreamError::empty(Provider::CoinCap))?;

        let prices = self.fetch_history(&asset.id).await.unwrap_or_else(|e| {
            warn!("[CoinCap] history for {} unavailable: {}", asset.id, e);
            Vec::new()
        });

        let volume = parse_num(&asset.volume_usd_24_hr).unwrap_or(0.0);
        let vwap = parse_num(&asset.vwap_24_hr).unwrap_or(price);
        let supply = parse_num(&asset.supply).unwrap_or(0.0);

        let market_data = DetailMarketData {
            current_price: UsdAmount::new(price),
            market_cap: UsdAmount::new(parse_num(&asset.market_cap_usd).unwrap_or(0.0)),
            total_volume: UsdAmount::new(volume),
            price_change_percentage_24h: parse_num(&asset.change_percent_24_hr).unwrap_or(0.0),
            high_24h: UsdAmount::new(vwap.max(price)),
            low_24h: UsdAmount::new(vwap.min(price)),
            circulating_supply: supply,
            total_supply: supply,
        };

        // The history endpoint has no volume, so each point carries today's
        let volumes = prices.iter().map(|(ts, _)| (*ts, volume)).collect();

        Ok(CoinDetail::new(
            asset.id.clone(),
            asset.symbol.clone(),
            asset.name.clone(),
            "",
            market_data,
            prices,
            volumes,
        ))
    }

    async fn ping(&self) -> Result<(), UpstreamError> {
        let request = self
            .http
            .get(&format!("{}/assets", self.base_url))
            .query(&[("limit", "1")])
            .timeout(PING_TIMEOUT);
        self.http.probe(request).await
    }
}
