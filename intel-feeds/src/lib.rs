//! Upstream market-data feeds
//!
//! One client per provider, each returning the provider's raw listing
//! payload, plus the normalizer that maps any of those payloads (or a
//! snapshot file written from one) onto [`intel_core::NormalizedCoin`].

pub mod binance;
pub mod coincap;
pub mod coingecko;
pub mod coinmarketcap;
pub mod config;
pub mod cryptocompare;
pub mod feed;
pub mod history;
mod http;
pub mod normalize;
pub mod types;

pub use binance::BinanceClient;
pub use coincap::CoinCapClient;
pub use coingecko::CoinGeckoClient;
pub use coinmarketcap::CoinMarketCapClient;
pub use config::FeedConfig;
pub use cryptocompare::CryptoCompareClient;
pub use feed::{build_feeds, MarketFeed, RawPayload};
pub use normalize::{normalize, normalize_snapshot};
