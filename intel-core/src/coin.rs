//! Normalized coin records and their derived overview

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of points in a 7 day sparkline (oldest first)
pub const SPARKLINE_POINTS: usize = 7;

/// 7 day price sparkline, serialized as `{"price": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sparkline {
    pub price: Vec<f64>,
}

impl Sparkline {
    pub fn new(price: Vec<f64>) -> Self {
        Self { price }
    }
}

/// Canonical per-coin record produced from any upstream tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCoin {
    /// Stable lowercase slug, unique within a dataset
    pub id: String,

    /// Lowercase ticker
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Price in USD
    pub current_price: f64,

    /// 24 hour change in percent (may be negative)
    pub price_change_percentage_24h: f64,

    /// Market capitalisation in USD
    pub market_cap: f64,

    /// 24 hour traded volume in USD
    pub total_volume: f64,

    /// Optional 7 day sparkline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparkline_in_7d: Option<Sparkline>,
}

impl NormalizedCoin {
    /// Whether the record may be kept in a dataset
    ///
    /// Identity fields must be non-empty, the price strictly positive and
    /// market cap / volume finite and non-negative.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
            && !self.symbol.is_empty()
            && !self.name.is_empty()
            && self.current_price.is_finite()
            && self.current_price > 0.0
            && self.price_change_percentage_24h.is_finite()
            && self.market_cap.is_finite()
            && self.market_cap >= 0.0
            && self.total_volume.is_finite()
            && self.total_volume >= 0.0
    }

    /// Sparkline prices, if the source supplied any
    pub fn sparkline(&self) -> Option<&[f64]> {
        self.sparkline_in_7d.as_ref().map(|s| s.price.as_slice())
    }

    /// Case-insensitive match against id or ticker
    pub fn matches(&self, id_or_symbol: &str) -> bool {
        self.id.eq_ignore_ascii_case(id_or_symbol) || self.symbol.eq_ignore_ascii_case(id_or_symbol)
    }
}

/// Trading recommendation derived from a snapshot of a coin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "strong_buy",
            Recommendation::Buy => "buy",
            Recommendation::Hold => "hold",
            Recommendation::Sell => "sell",
        }
    }

    /// Human readable label used in insight text
    pub fn display_name(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Sell => "Reduce / sell",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized coin plus freshly computed analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinOverview {
    #[serde(flatten)]
    pub coin: NormalizedCoin,

    /// Composite score in `[0, 1]`
    pub score: f64,

    pub recommendation: Recommendation,

    /// Natural language summary, never empty
    pub insight: String,
}
