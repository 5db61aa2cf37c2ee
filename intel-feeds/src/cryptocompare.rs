//! CryptoCompare API client
//!
//! Keyed provider. Listings come from `/top/mktcapfull`; 7 day sparklines
//! are merged in from `/v2/histoday` in small concurrent batches.

use crate::config::{FeedConfig, PING_TIMEOUT, SPARKLINE_TIMEOUT};
use crate::feed::{MarketFeed, RawPayload};
use crate::http::{array_field, FeedHttp};
use crate::types::{downsample, CcListingEntry, CcRawQuote};
use async_trait::async_trait;
use futures::future::join_all;
use intel_core::{
    CoinDetail, DetailMarketData, FetchMode, Provider, SeriesPoint, UpstreamError, UsdAmount,
    SPARKLINE_POINTS,
};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Coins per histoday batch
const SPARKLINE_BATCH_SIZE: usize = 10;

/// Hourly points in 30 days
const DETAIL_HISTORY_HOURS: u32 = 720;

#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Data", default)]
    data: Option<HistoData>,
}

#[derive(Debug, Deserialize)]
struct HistoData {
    #[serde(rename = "Data", default)]
    data: Vec<HistoBar>,
}

#[derive(Debug, Deserialize)]
struct HistoBar {
    time: i64,
    #[serde(default)]
    close: Option<f64>,
    #[serde(default)]
    volumefrom: Option<f64>,
}

/// CryptoCompare API client
#[derive(Clone)]
pub struct CryptoCompareClient {
    http: FeedHttp,
    base_url: String,
    api_key: Option<String>,
    limit: usize,
    timeout: Duration,
}

impl CryptoCompareClient {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            http: FeedHttp::new(Provider::CryptoCompare, config.timeout),
            base_url: config.cryptocompare_base_url.trim_end_matches('/').to_string(),
            api_key: config.cryptocompare_api_key.clone(),
            limit: config.listing_limit,
            timeout: config.timeout,
        }
    }

    fn api_key(&self) -> Result<&str, UpstreamError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::missing_key(Provider::CryptoCompare))
    }

    fn get(&self, path: &str, key: &str) -> reqwest::RequestBuilder {
        self.http
            .get(&format!("{}{}", self.base_url, path))
            .header("authorization", format!("Apikey {}", key))
    }

    async fn fetch_histo(
        &self,
        key: &str,
        path: &str,
        symbol: &str,
        limit: u32,
        timeout: Duration,
    ) -> Result<Vec<HistoBar>, UpstreamError> {
        let request = self
            .get(path, key)
            .query(&[
                ("fsym", symbol.to_uppercase()),
                ("tsym", "USD".to_string()),
                ("limit", limit.to_string()),
            ])
            .timeout(timeout);
        let body = self.http.send_json(request).await?;
        let parsed: HistoResponse = serde_json::from_value(body)
            .map_err(|e| UpstreamError::malformed(Provider::CryptoCompare, e.to_string()))?;

        Ok(parsed.data.map(|d| d.data).unwrap_or_default())
    }

    /// Attach daily closes to each listing record, best-effort
    ///
    /// Batches that finish are written into `records` immediately, so a
    /// caller may cancel this part way through.
    async fn enrich_sparklines(&self, key: &str, records: &mut [Value]) {
        let request_timeout = self.timeout.min(SPARKLINE_TIMEOUT);
        let symbols: Vec<Option<String>> = records
            .iter()
            .map(|r| {
                r.pointer("/CoinInfo/Name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect();

        for (chunk_index, chunk) in symbols.chunks(SPARKLINE_BATCH_SIZE).enumerate() {
            let fetches = chunk.iter().map(|symbol| async move {
                let Some(symbol) = symbol.as_deref() else {
                    return None;
                };
                match self
                    .fetch_histo(key, "/v2/histoday", symbol, 7, request_timeout)
                    .await
                {
                    Ok(bars) => sparkline_closes(&bars),
                    Err(e) => {
                        debug!("[CryptoCompare] sparkline for {} skipped: {}", symbol, e);
                        None
                    }
                }
            });

            let results = join_all(fetches).await;
            let offset = chunk_index * SPARKLINE_BATCH_SIZE;
            for (i, closes) in results.into_iter().enumerate() {
                if let (Some(closes), Some(Value::Object(record))) =
                    (closes, records.get_mut(offset + i))
                {
                    record.insert("Sparkline".to_string(), Value::from(closes));
                }
            }
        }
    }
}

/// Daily closes reduced to a sparkline (`limit=7` returns 8 bars)
fn sparkline_closes(bars: &[HistoBar]) -> Option<Vec<f64>> {
    let closes: Vec<f64> = bars.iter().filter_map(|b| b.close).collect();
    (!closes.is_empty()).then(|| downsample(&closes, SPARKLINE_POINTS))
}

#[async_trait]
impl MarketFeed for CryptoCompareClient {
    fn provider(&self) -> Provider {
        Provider::CryptoCompare
    }

    #[instrument(skip(self))]
    async fn fetch_markets(&self, mode: FetchMode) -> Result<RawPayload, UpstreamError> {
        let key = self.api_key()?;
        let url = format!("{}/top/mktcapfull", self.base_url);
        debug!("[CryptoCompare] GET {}", url);
        let start = Instant::now();

        let request = self.get("/top/mktcapfull", key).query(&[
            ("limit", self.limit.to_string()),
            ("tsym", "USD".to_string()),
        ]);
        let body = self.http.send_json(request).await?;
        let mut records = array_field(Provider::CryptoCompare, body, "Data")?;

        if mode == FetchMode::Full {
            // Enrichment shares the listing's request budget
            let budget = self.timeout.saturating_sub(start.elapsed());
            if tokio::time::timeout(budget, self.enrich_sparklines(key, &mut records))
                .await
                .is_err()
            {
                warn!(
                    "[CryptoCompare] sparkline enrichment cut off after {}ms",
                    start.elapsed().as_millis()
                );
            }
        }

        info!(
            "[CryptoCompare] {} coins in {}ms",
            records.len(),
            start.elapsed().as_millis()
        );
        Ok(RawPayload::new(Provider::CryptoCompare, records))
    }

    #[instrument(skip(self))]
    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, UpstreamError> {
        let key = self.api_key()?;
        let symbol = id.to_uppercase();

        let price_request = self
            .get("/pricemultifull", key)
            .query(&[("fsyms", symbol.as_str()), ("tsyms", "USD")]);

        let (price_body, history) = futures::join!(
            self.http.send_json(price_request),
            self.fetch_histo(key, "/v2/histohour", &symbol, DETAIL_HISTORY_HOURS, self.timeout)
        );

        let price_body = price_body?;
        let quote: CcRawQuote = price_body
            .pointer(&format!("/RAW/{}/USD", symbol))
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| UpstreamError::malformed(Provider::CryptoCompare, e.to_string()))?
            .ok_or_else(|| {
                UpstreamError::malformed(Provider::CryptoCompare, format!("no quote for {}", symbol))
            })?;

        let price = quote
            .price
            .filter(|p| *p > 0.0)
            .ok_or_else(|| UpstreamError::empty(Provider::CryptoCompare))?;

        let bars = history.unwrap_or_else(|e| {
            warn!("[CryptoCompare] history for {} unavailable: {}", symbol, e);
            Vec::new()
        });
        let prices: Vec<SeriesPoint> = bars
            .iter()
            .map(|b| (b.time * 1000, b.close.unwrap_or(price)))
            .collect();
        let volumes: Vec<SeriesPoint> = bars
            .iter()
            .map(|b| (b.time * 1000, b.volumefrom.unwrap_or(0.0) * b.close.unwrap_or(price)))
            .collect();

        let supply = quote.supply.unwrap_or(0.0);
        let market_data = DetailMarketData {
            current_price: UsdAmount::new(price),
            market_cap: UsdAmount::new(quote.mktcap.unwrap_or(0.0)),
            total_volume: UsdAmount::new(quote.usd_volume().unwrap_or(0.0)),
            price_change_percentage_24h: quote.changepct24hour.unwrap_or(0.0),
            high_24h: UsdAmount::new(quote.high24hour.unwrap_or(price)),
            low_24h: UsdAmount::new(quote.low24hour.unwrap_or(price)),
            circulating_supply: supply,
            total_supply: supply,
        };

        let name = quote.fromsymbol.clone().unwrap_or_else(|| symbol.clone());
        Ok(CoinDetail::new(
            id.to_lowercase(),
            symbol,
            name,
            "",
            market_data,
            prices,
            volumes,
        ))
    }

    async fn ping(&self) -> Result<(), UpstreamError> {
        let key = self.api_key()?;
        let request = self
            .get("/price", key)
            .query(&[("fsym", "BTC"), ("tsyms", "USD")])
            .timeout(PING_TIMEOUT);
        self.http.probe(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local upstream that answers the listing but never answers histoday
    async fn stalled_histoday_upstream(rows: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let data: Vec<Value> = (0..rows)
            .map(|i| {
                json!({
                    "CoinInfo": {"Name": format!("C{}", i), "FullName": format!("Coin {}", i)},
                    "RAW": {"USD": {"PRICE": 1.0 + i as f64, "CHANGEPCT24HOUR": 0.5, "MKTCAP": 1.0e9, "VOLUME24HOURTO": 1.0e7}}
                })
            })
            .collect();
        let body = json!({"Data": data}).to_string();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let body = body.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let mut read = 0;
                    while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf[read..]).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => read += n,
                        }
                        if read == buf.len() {
                            return;
                        }
                    }

                    let request = String::from_utf8_lossy(&buf[..read]).to_string();
                    if request.contains("/top/mktcapfull") {
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                    } else {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    }
                });
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_stalled_sparklines_stay_within_request_timeout() {
        let client = CryptoCompareClient::new(&FeedConfig {
            cryptocompare_api_key: Some("test-key".to_string()),
            cryptocompare_base_url: stalled_histoday_upstream(50).await,
            timeout: Duration::from_secs(1),
            ..FeedConfig::default()
        });

        let start = Instant::now();
        let payload = client.fetch_markets(FetchMode::Full).await.unwrap();

        assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());
        assert_eq!(payload.len(), 50);
        assert!(payload.records.iter().all(|r| r.get("Sparkline").is_none()));
    }

    #[test]
    fn test_histoday_bars_become_seven_points() {
        let bars: Vec<HistoBar> = (0..8)
            .map(|i| HistoBar {
                time: 1_700_000_000 + i * 86_400,
                close: Some(100.0 + i as f64),
                volumefrom: None,
            })
            .collect();

        let closes = sparkline_closes(&bars).unwrap();
        assert_eq!(closes.len(), SPARKLINE_POINTS);
        assert_eq!(closes[0], 100.0);
        assert_eq!(closes[6], 107.0);

        let empty = [HistoBar { time: 0, close: None, volumefrom: None }];
        assert_eq!(sparkline_closes(&empty), None);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = CryptoCompareClient::new(&FeedConfig {
            cryptocompare_base_url: "http://127.0.0.1:9".to_string(),
            ..FeedConfig::default()
        });

        let err = client.fetch_markets(FetchMode::Full).await.unwrap_err();
        assert_eq!(err, UpstreamError::missing_key(Provider::CryptoCompare));

        let err = client.fetch_coin_detail("btc").await.unwrap_err();
        assert_eq!(err.message, "API key not configured");

        assert!(client.ping().await.is_err());
    }

    #[test]
    fn test_histo_response_parses() {
        let parsed: HistoResponse = serde_json::from_value(serde_json::json!({
            "Response": "Success",
            "Data": {"Data": [{"time": 1700000000, "close": 45000.0, "volumefrom": 10.0}]}
        }))
        .unwrap();
        let bars = parsed.data.unwrap().data;
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, Some(45000.0));
    }
}
