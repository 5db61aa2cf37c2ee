//! The provider client seam

use crate::config::FeedConfig;
use crate::{BinanceClient, CoinCapClient, CoinGeckoClient, CoinMarketCapClient, CryptoCompareClient};
use async_trait::async_trait;
use intel_core::{CoinDetail, FetchMode, Provider, UpstreamError};
use serde_json::Value;
use std::sync::Arc;

/// Raw listing records exactly as one provider returned them
///
/// Records keep the provider's own field names so they can be written to
/// the local snapshot file and normalized again later.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    pub provider: Provider,
    pub records: Vec<Value>,
}

impl RawPayload {
    pub fn new(provider: Provider, records: Vec<Value>) -> Self {
        Self { provider, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One upstream market-data provider
///
/// Implementations make a single attempt per call. Trying another
/// provider after a failure is the caller's job.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    fn provider(&self) -> Provider;

    /// Fetch the top coins listing
    async fn fetch_markets(&self, mode: FetchMode) -> Result<RawPayload, UpstreamError>;

    /// Fetch a single coin with 30 days of history
    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, UpstreamError> {
        let _ = id;
        Err(UpstreamError::unsupported(self.provider(), "coin detail"))
    }

    /// Cheap connectivity probe
    async fn ping(&self) -> Result<(), UpstreamError>;
}

/// Build every provider client in priority order
pub fn build_feeds(config: &FeedConfig) -> Vec<Arc<dyn MarketFeed>> {
    vec![
        Arc::new(CryptoCompareClient::new(config)),
        Arc::new(CoinMarketCapClient::new(config)),
        Arc::new(CoinGeckoClient::new(config)),
        Arc::new(CoinCapClient::new(config)),
        Arc::new(BinanceClient::new(config)),
    ]
}
