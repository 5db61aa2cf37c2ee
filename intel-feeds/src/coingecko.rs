//! CoinGecko API client
//!
//! Free provider with the richest payload. The listing is requested with
//! or without the 7 day sparkline depending on [`FetchMode`].

use crate::config::{FeedConfig, PING_TIMEOUT};
use crate::feed::{MarketFeed, RawPayload};
use crate::http::{top_level_array, FeedHttp};
use async_trait::async_trait;
use intel_core::{
    CoinDetail, DetailMarketData, FetchMode, Provider, SeriesPoint, UpstreamError, UsdAmount,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Description excerpt kept from `/coins/{id}`
const DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
struct CoinResponse {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    description: HashMap<String, String>,
    #[serde(default)]
    market_data: Option<CoinMarketData>,
    #[serde(default)]
    community_data: Option<Value>,
    #[serde(default)]
    developer_data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CoinMarketData {
    #[serde(default)]
    current_price: HashMap<String, Option<f64>>,
    #[serde(default)]
    market_cap: HashMap<String, Option<f64>>,
    #[serde(default)]
    total_volume: HashMap<String, Option<f64>>,
    #[serde(default)]
    high_24h: HashMap<String, Option<f64>>,
    #[serde(default)]
    low_24h: HashMap<String, Option<f64>>,
    #[serde(default)]
    price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    circulating_supply: Option<f64>,
    #[serde(default)]
    total_supply: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    total_volumes: Vec<(f64, Option<f64>)>,
}

fn usd(map: &HashMap<String, Option<f64>>) -> f64 {
    map.get("usd").copied().flatten().unwrap_or(0.0)
}

fn series(points: &[(f64, Option<f64>)]) -> Vec<SeriesPoint> {
    points
        .iter()
        .filter_map(|(ts, v)| Some((*ts as i64, (*v)?)))
        .collect()
}

impl CoinResponse {
    fn into_detail(self, chart: MarketChart) -> CoinDetail {
        let md = self.market_data.unwrap_or_default();
        let description: String = self
            .description
            .get("en")
            .map(|d| d.chars().take(DESCRIPTION_MAX_CHARS).collect())
            .unwrap_or_default();

        let market_data = DetailMarketData {
            current_price: UsdAmount::new(usd(&md.current_price)),
            market_cap: UsdAmount::new(usd(&md.market_cap)),
            total_volume: UsdAmount::new(usd(&md.total_volume)),
            price_change_percentage_24h: md.price_change_percentage_24h.unwrap_or(0.0),
            high_24h: UsdAmount::new(usd(&md.high_24h)),
            low_24h: UsdAmount::new(usd(&md.low_24h)),
            circulating_supply: md.circulating_supply.unwrap_or(0.0),
            total_supply: md.total_supply.unwrap_or(0.0),
        };

        let mut detail = CoinDetail::new(
            self.id,
            self.symbol,
            self.name,
            description,
            market_data,
            series(&chart.prices),
            series(&chart.total_volumes),
        );
        if let Some(community) = self.community_data.filter(Value::is_object) {
            detail.community_data = community;
        }
        if let Some(developer) = self.developer_data.filter(Value::is_object) {
            detail.developer_data = developer;
        }
        detail
    }
}

/// CoinGecko API client
#[derive(Clone)]
pub struct CoinGeckoClient {
    http: FeedHttp,
    base_url: String,
    limit: usize,
}

impl CoinGeckoClient {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            http: FeedHttp::new(Provider::CoinGecko, config.timeout),
            base_url: config.coingecko_base_url.trim_end_matches('/').to_string(),
            limit: config.listing_limit,
        }
    }
}

#[async_trait]
impl MarketFeed for CoinGeckoClient {
    fn provider(&self) -> Provider {
        Provider::CoinGecko
    }

    #[instrument(skip(self))]
    async fn fetch_markets(&self, mode: FetchMode) -> Result<RawPayload, UpstreamError> {
        let url = format!("{}/coins/markets", self.base_url);
        let sparkline = mode == FetchMode::Full;
        debug!("[CoinGecko] GET {} (sparkline: {})", url, sparkline);
        let start = Instant::now();

        let request = self.http.get(&url).query(&[
            ("vs_currency", "usd".to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", self.limit.to_string()),
            ("page", "1".to_string()),
            ("sparkline", sparkline.to_string()),
            ("price_change_percentage", "24h".to_string()),
        ]);
        let body = self.http.send_json(request).await?;
        let records = top_level_array(Provider::CoinGecko, body)?;

        info!(
            "[CoinGecko] {} coins in {}ms",
            records.len(),
            start.elapsed().as_millis()
        );
        Ok(RawPayload::new(Provider::CoinGecko, records))
    }

    #[instrument(skip(self))]
    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, UpstreamError> {
        let coin_request = self
            .http
            .get(&format!("{}/coins/{}", self.base_url, id))
            .query(&[
                ("localization", "false"),
                ("tickers", "false"),
                ("market_data", "true"),
                ("community_data", "true"),
                ("developer_data", "true"),
                ("sparkline", "false"),
            ]);
        let chart_request = self
            .http
            .get(&format!("{}/coins/{}/market_chart", self.base_url, id))
            .query(&[("vs_currency", "usd"), ("days", "30")]);

        let (coin_body, chart_body) = futures::try_join!(
            self.http.send_json(coin_request),
            self.http.send_json(chart_request)
        )?;

        let coin: CoinResponse = serde_json::from_value(coin_body)
            .map_err(|e| UpstreamError::malformed(Provider::CoinGecko, e.to_string()))?;
        let chart: MarketChart = serde_json::from_value(chart_body)
            .map_err(|e| UpstreamError::malformed(Provider::CoinGecko, e.to_string()))?;

        Ok(coin.into_detail(chart))
    }

    async fn ping(&self) -> Result<(), UpstreamError> {
        let request = self
            .http
            .get(&format!("{}/ping", self.base_url))
            .timeout(PING_TIMEOUT);
        self.http.probe(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coin_response_into_detail() {
        let coin: CoinResponse = serde_json::from_value(json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "description": {"en": "x".repeat(2000)},
            "market_data": {
                "current_price": {"usd": 45000.0, "eur": 41000.0},
                "market_cap": {"usd": 8.8e11},
                "total_volume": {"usd": 2.5e10},
                "high_24h": {"usd": 46000.0},
                "low_24h": {"usd": 44000.0},
                "price_change_percentage_24h": 3.2,
                "circulating_supply": 19500000.0,
                "total_supply": null
            },
            "community_data": {"twitter_followers": 1},
            "developer_data": null
        }))
        .unwrap();
        let chart: MarketChart = serde_json::from_value(json!({
            "prices": [[1700000000000.0, 44000.0], [1700003600000.0, null]],
            "total_volumes": [[1700000000000.0, 1.0e9]]
        }))
        .unwrap();

        let detail = coin.into_detail(chart);
        assert_eq!(detail.market_data.current_price.usd, 45000.0);
        assert_eq!(detail.market_data.total_supply, 0.0);
        assert_eq!(detail.description.chars().count(), DESCRIPTION_MAX_CHARS);
        assert_eq!(detail.community_data["twitter_followers"], json!(1));
        assert_eq!(detail.developer_data, json!({}));
        assert_eq!(detail.prices, vec![(1_700_000_000_000, 44000.0)]);
        assert_eq!(detail.volumes.len(), 1);
    }
}
