//! Per-coin detail record with 30 day history

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `(timestamp_ms, value)` pair, oldest first within a series
pub type SeriesPoint = (i64, f64);

/// Description used when no tier could describe a coin
pub const STUB_DESCRIPTION: &str =
    "Unable to fetch details for this coin right now, please try again later.";

/// A USD denominated amount, serialized as `{"usd": ...}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsdAmount {
    pub usd: f64,
}

impl UsdAmount {
    pub fn new(usd: f64) -> Self {
        Self { usd }
    }
}

/// Market block of a coin detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailMarketData {
    pub current_price: UsdAmount,
    pub market_cap: UsdAmount,
    pub total_volume: UsdAmount,
    pub price_change_percentage_24h: f64,
    pub high_24h: UsdAmount,
    pub low_24h: UsdAmount,
    pub circulating_supply: f64,
    pub total_supply: f64,
}

/// Detailed view of a single coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub market_data: DetailMarketData,

    /// Provider specific community metrics (empty object when absent)
    #[serde(default = "empty_object")]
    pub community_data: Value,

    /// Provider specific developer metrics (empty object when absent)
    #[serde(default = "empty_object")]
    pub developer_data: Value,

    /// Price history in USD
    pub prices: Vec<SeriesPoint>,

    /// Volume history in USD
    pub volumes: Vec<SeriesPoint>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl CoinDetail {
    /// Build a detail with empty community/developer blocks
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        market_data: DetailMarketData,
        prices: Vec<SeriesPoint>,
        volumes: Vec<SeriesPoint>,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            description: description.into(),
            market_data,
            community_data: empty_object(),
            developer_data: empty_object(),
            prices,
            volumes,
        }
    }

    /// Last-resort record: all-zero market data and an explanation
    pub fn stub(id: &str) -> Self {
        Self::new(
            id,
            id.to_uppercase(),
            id,
            STUB_DESCRIPTION,
            DetailMarketData::default(),
            Vec::new(),
            Vec::new(),
        )
    }
}
