//! Provider listing record types
//!
//! These types mirror each upstream's listing response and are converted
//! to [`NormalizedCoin`] by the normalizer. Every numeric field is optional
//! because upstreams routinely send `null` or omit fields for thin markets.

use crate::http::parse_num;
use intel_core::{NormalizedCoin, Sparkline, SPARKLINE_POINTS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Quote currency suffix kept from Binance tickers
pub const BINANCE_QUOTE_SUFFIX: &str = "USDT";

/// Binance has no supply data, so market cap is estimated from turnover
pub const BINANCE_MCAP_VOLUME_MULTIPLIER: f64 = 10.0;

// ============================================================================
// CryptoCompare
// ============================================================================

/// One entry of `/top/mktcapfull`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CcListingEntry {
    #[serde(rename = "CoinInfo")]
    pub coin_info: CcCoinInfo,

    #[serde(rename = "RAW", default)]
    pub raw: Option<HashMap<String, CcRawQuote>>,

    /// Daily closes merged in from `/v2/histoday`
    #[serde(rename = "Sparkline", default, skip_serializing_if = "Option::is_none")]
    pub sparkline: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CcCoinInfo {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "FullName", default)]
    pub full_name: Option<String>,
}

/// Raw USD quote block shared by listing and `pricemultifull`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct CcRawQuote {
    #[serde(default)]
    pub fromsymbol: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub changepct24hour: Option<f64>,
    #[serde(default)]
    pub mktcap: Option<f64>,
    #[serde(default)]
    pub volume24hour: Option<f64>,
    #[serde(default)]
    pub volume24hourto: Option<f64>,
    #[serde(default, rename = "TOTALVOLUME24HTO")]
    pub total_volume_24h_to: Option<f64>,
    #[serde(default)]
    pub high24hour: Option<f64>,
    #[serde(default)]
    pub low24hour: Option<f64>,
    #[serde(default)]
    pub supply: Option<f64>,
}

impl CcRawQuote {
    /// USD volume; falls back to coin volume times price
    pub fn usd_volume(&self) -> Option<f64> {
        self.volume24hourto
            .or(self.total_volume_24h_to)
            .or_else(|| Some(self.volume24hour? * self.price?))
    }
}

impl CcListingEntry {
    pub fn to_normalized(&self) -> Option<NormalizedCoin> {
        let quote = self.raw.as_ref()?.get("USD")?;
        let ticker = self.coin_info.name.to_lowercase();

        Some(NormalizedCoin {
            id: ticker.clone(),
            symbol: ticker,
            name: self
                .coin_info
                .full_name
                .clone()
                .unwrap_or_else(|| self.coin_info.name.clone()),
            current_price: quote.price?,
            price_change_percentage_24h: quote.changepct24hour.unwrap_or(0.0),
            market_cap: quote.mktcap?,
            total_volume: quote.usd_volume()?,
            sparkline_in_7d: self.sparkline.as_deref().and_then(clean_sparkline),
        })
    }
}

// ============================================================================
// CoinMarketCap
// ============================================================================

/// One entry of `/cryptocurrency/listings/latest` or `/quotes/latest`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CmcListingEntry {
    #[serde(default)]
    pub slug: Option<String>,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub quote: HashMap<String, CmcQuote>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CmcQuote {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub percent_change_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub high_24h: Option<f64>,
    #[serde(default)]
    pub low_24h: Option<f64>,
}

impl CmcListingEntry {
    pub fn usd(&self) -> Option<&CmcQuote> {
        self.quote.get("USD")
    }

    pub fn id(&self) -> String {
        self.slug
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.symbol.to_lowercase())
    }

    pub fn to_normalized(&self) -> Option<NormalizedCoin> {
        let quote = self.usd()?;

        Some(NormalizedCoin {
            id: self.id(),
            symbol: self.symbol.to_lowercase(),
            name: self.name.clone(),
            current_price: quote.price?,
            price_change_percentage_24h: quote.percent_change_24h.unwrap_or(0.0),
            market_cap: quote.market_cap?,
            total_volume: quote.volume_24h?,
            sparkline_in_7d: None,
        })
    }
}

// ============================================================================
// CoinGecko
// ============================================================================

/// One entry of `/coins/markets`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoinGeckoMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparkline_in_7d: Option<CoinGeckoSparkline>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CoinGeckoSparkline {
    #[serde(default)]
    pub price: Vec<Option<f64>>,
}

impl CoinGeckoMarket {
    pub fn to_normalized(&self) -> Option<NormalizedCoin> {
        let sparkline = self.sparkline_in_7d.as_ref().and_then(|s| {
            let points: Vec<f64> = s.price.iter().flatten().copied().collect();
            clean_sparkline(&downsample(&points, SPARKLINE_POINTS))
        });

        Some(NormalizedCoin {
            id: self.id.clone(),
            symbol: self.symbol.to_lowercase(),
            name: self.name.clone(),
            current_price: self.current_price?,
            price_change_percentage_24h: self.price_change_percentage_24h.unwrap_or(0.0),
            market_cap: self.market_cap?,
            total_volume: self.total_volume?,
            sparkline_in_7d: sparkline,
        })
    }
}

// ============================================================================
// CoinCap
// ============================================================================

/// One entry of `/assets`; CoinCap encodes every number as a string
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinCapAsset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub change_percent_24_hr: Option<String>,
    #[serde(default)]
    pub market_cap_usd: Option<String>,
    #[serde(default)]
    pub volume_usd_24_hr: Option<String>,
    #[serde(default)]
    pub supply: Option<String>,
    #[serde(default)]
    pub vwap_24_hr: Option<String>,
}

impl CoinCapAsset {
    pub fn price(&self) -> Option<f64> {
        parse_num(&self.price_usd)
    }

    pub fn to_normalized(&self) -> Option<NormalizedCoin> {
        Some(NormalizedCoin {
            id: self.id.clone(),
            symbol: self.symbol.to_lowercase(),
            name: self.name.clone(),
            current_price: self.price()?,
            price_change_percentage_24h: parse_num(&self.change_percent_24_hr).unwrap_or(0.0),
            market_cap: parse_num(&self.market_cap_usd)?,
            total_volume: parse_num(&self.volume_usd_24_hr)?,
            sparkline_in_7d: None,
        })
    }
}

// ============================================================================
// Binance
// ============================================================================

/// One entry of `/ticker/24hr`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceTicker {
    pub symbol: String,
    #[serde(default)]
    pub last_price: Option<String>,
    #[serde(default)]
    pub price_change_percent: Option<String>,
    #[serde(default)]
    pub quote_volume: Option<String>,
}

impl BinanceTicker {
    /// Lowercase base asset of a USDT pair
    pub fn base_asset(&self) -> Option<String> {
        self.symbol
            .strip_suffix(BINANCE_QUOTE_SUFFIX)
            .filter(|base| !base.is_empty())
            .map(str::to_lowercase)
    }

    pub fn quote_volume(&self) -> f64 {
        parse_num(&self.quote_volume).unwrap_or(0.0)
    }

    pub fn to_normalized(&self) -> Option<NormalizedCoin> {
        let base = self.base_asset()?;
        let volume = parse_num(&self.quote_volume)?;

        Some(NormalizedCoin {
            id: base.clone(),
            symbol: base.clone(),
            name: base.to_uppercase(),
            current_price: parse_num(&self.last_price)?,
            price_change_percentage_24h: parse_num(&self.price_change_percent).unwrap_or(0.0),
            market_cap: volume * BINANCE_MCAP_VOLUME_MULTIPLIER,
            total_volume: volume,
            sparkline_in_7d: None,
        })
    }
}

// ============================================================================
// Sparkline helpers
// ============================================================================

/// Pick `target` evenly spaced points, always keeping first and last
pub fn downsample(points: &[f64], target: usize) -> Vec<f64> {
    if points.len() <= target || target < 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    (0..target)
        .map(|i| {
            let idx = (i * last + (target - 1) / 2) / (target - 1);
            points[idx.min(last)]
        })
        .collect()
}

/// Keep finite points only; `None` when nothing usable remains
fn clean_sparkline(points: &[f64]) -> Option<Sparkline> {
    let price: Vec<f64> = points.iter().copied().filter(|p| p.is_finite()).collect();
    if price.is_empty() {
        None
    } else {
        Some(Sparkline::new(price))
    }
}
