//! Market service: tiered aggregation for the overview and coin details
//!
//! The overview walks live feeds, then the local snapshot, then synthetic
//! data, and remembers which tier last succeeded. Neither public read
//! operation ever fails; degraded data is shaped exactly like live data.

use crate::analytics::AnalyticsEngine;
use crate::fallback::{first_success, Attempt};
use crate::snapshot::LocalSnapshotStore;
use crate::synthetic::SyntheticDataGenerator;
use chrono::Utc;
use futures::future::join_all;
use intel_core::{
    CoinDetail, CoinOverview, DetailMarketData, FetchMode, IntelError, NormalizedCoin, Provider,
    Tier, UpstreamError, UsdAmount,
};
use intel_feeds::history::history_from_sparkline;
use intel_feeds::{normalize, MarketFeed};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Cold-start order of live attempts
pub const LIVE_CHAIN: [(Provider, FetchMode); 6] = [
    (Provider::CryptoCompare, FetchMode::Full),
    (Provider::CoinMarketCap, FetchMode::Full),
    (Provider::CoinGecko, FetchMode::Full),
    (Provider::CoinGecko, FetchMode::Reduced),
    (Provider::CoinCap, FetchMode::Full),
    (Provider::Binance, FetchMode::Full),
];

/// Providers asked for coin details, in order
pub const DETAIL_CHAIN: [Provider; 4] = [
    Provider::CryptoCompare,
    Provider::CoinMarketCap,
    Provider::CoinGecko,
    Provider::CoinCap,
];

/// Keyed providers retried with the ticker during reconstruction
const DETAIL_SYMBOL_RETRY: [Provider; 2] = [Provider::CryptoCompare, Provider::CoinMarketCap];

/// Reconstructed 24h range around the current price
const RECONSTRUCTED_RANGE: f64 = 0.05;

/// Outcome of probing one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub provider: Provider,
    pub ok: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Aggregates market data across every tier
pub struct MarketService {
    feeds: Vec<Arc<dyn MarketFeed>>,
    snapshot: LocalSnapshotStore,
    synthetic: SyntheticDataGenerator,
    analytics: AnalyticsEngine,
    /// Tier that produced the last overview, `None` until one succeeds
    preference: Mutex<Option<Tier>>,
    force_refresh: AtomicBool,
}

impl MarketService {
    pub fn new(feeds: Vec<Arc<dyn MarketFeed>>, snapshot: LocalSnapshotStore) -> Self {
        Self::with_generator(feeds, snapshot, SyntheticDataGenerator::new())
    }

    pub fn with_generator(
        feeds: Vec<Arc<dyn MarketFeed>>,
        snapshot: LocalSnapshotStore,
        synthetic: SyntheticDataGenerator,
    ) -> Self {
        Self {
            feeds,
            snapshot,
            synthetic,
            analytics: AnalyticsEngine::new(),
            preference: Mutex::new(None),
            force_refresh: AtomicBool::new(false),
        }
    }

    /// Request that the next overview re-probes from the top of the chain
    ///
    /// Process-wide: whichever caller runs the next overview consumes it.
    pub fn set_force_refresh(&self, flag: bool) {
        self.force_refresh.store(flag, Ordering::SeqCst);
    }

    /// Tier that served the most recent overview
    pub fn current_tier(&self) -> Option<Tier> {
        *self.preference.lock()
    }

    fn feed(&self, provider: Provider) -> Option<&Arc<dyn MarketFeed>> {
        self.feeds.iter().find(|f| f.provider() == provider)
    }

    // ========================================================================
    // Overview
    // ========================================================================

    /// Top coins with analytics; never empty, never an error
    #[instrument(skip(self))]
    pub async fn get_market_overview(&self) -> Vec<CoinOverview> {
        if self.force_refresh.swap(false, Ordering::SeqCst) {
            info!("[MarketService] force refresh requested, clearing cached tier");
            *self.preference.lock() = None;
        }

        let cached = self.current_tier();
        let plan = overview_plan(cached);
        debug!("[MarketService] cached tier {:?}, plan {:?}", cached, plan);

        let attempts = plan
            .into_iter()
            .map(|tier| Attempt::new(tier, move || self.fetch_tier(tier)))
            .collect();

        let coins = match first_success("MarketService", attempts).await {
            Some((tier, coins)) => {
                if cached != Some(tier) {
                    info!("[MarketService] serving from {}", tier);
                }
                *self.preference.lock() = Some(tier);
                coins
            }
            None => {
                error!("[MarketService] every tier failed, generating synthetic data directly");
                *self.preference.lock() = Some(Tier::Synthetic);
                self.synthetic.generate()
            }
        };

        self.analytics.analyze_all(coins)
    }

    async fn fetch_tier(&self, tier: Tier) -> Result<Vec<NormalizedCoin>, IntelError> {
        let coins = match tier {
            Tier::Feed { provider, mode } => {
                let feed = self
                    .feed(provider)
                    .ok_or_else(|| UpstreamError::new(provider, "no client configured"))?;
                let payload = feed.fetch_markets(mode).await?;
                let coins = normalize(&payload)?;
                if coins.is_empty() {
                    return Err(UpstreamError::new(provider, "no usable records after normalization").into());
                }
                coins
            }
            Tier::LocalSnapshot => self.snapshot.load().await?,
            Tier::Synthetic => self.synthetic.generate(),
        };

        if coins.is_empty() {
            return Err(IntelError::internal(format!("{} produced no coins", tier)));
        }
        Ok(coins)
    }

    // ========================================================================
    // Coin detail
    // ========================================================================

    /// Detail for a slug or ticker; degrades to a stub, never an error
    #[instrument(skip(self))]
    pub async fn get_coin_detail(&self, id: &str) -> CoinDetail {
        let attempts = DETAIL_CHAIN
            .iter()
            .map(|&provider| Attempt::new(provider, move || self.fetch_detail(provider, id.to_string())))
            .collect();

        if let Some((_, detail)) = first_success("MarketService", attempts).await {
            return detail;
        }

        let overview = self.get_market_overview().await;
        let Some(entry) = overview.into_iter().find(|c| c.coin.matches(id)) else {
            warn!("[MarketService] {} not found anywhere, returning stub", id);
            return CoinDetail::stub(id);
        };

        if !entry.coin.symbol.eq_ignore_ascii_case(id) {
            let symbol = entry.coin.symbol.to_uppercase();
            let attempts = DETAIL_SYMBOL_RETRY
                .iter()
                .map(|&provider| {
                    let symbol = symbol.clone();
                    Attempt::new(provider, move || self.fetch_detail(provider, symbol))
                })
                .collect();

            if let Some((_, detail)) = first_success("MarketService", attempts).await {
                return detail;
            }
        }

        info!("[MarketService] reconstructing {} from the overview", entry.coin.id);
        reconstruct_detail(&entry)
    }

    async fn fetch_detail(&self, provider: Provider, id: String) -> Result<CoinDetail, IntelError> {
        let feed = self
            .feed(provider)
            .ok_or_else(|| UpstreamError::new(provider, "no client configured"))?;
        let detail = feed.fetch_coin_detail(&id).await?;

        if detail.market_data.current_price.usd > 0.0 {
            Ok(detail)
        } else {
            Err(UpstreamError::malformed(provider, "detail without a price").into())
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Probe every provider concurrently
    #[instrument(skip(self))]
    pub async fn diagnose(&self) -> Vec<ProbeResult> {
        let probes = self.feeds.iter().map(|feed| async move {
            let start = Instant::now();
            let result = feed.ping().await;
            let latency_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(()) => ProbeResult {
                    provider: feed.provider(),
                    ok: true,
                    latency_ms,
                    detail: None,
                },
                Err(e) => ProbeResult {
                    provider: feed.provider(),
                    ok: false,
                    latency_ms,
                    detail: Some(e.message),
                },
            }
        });

        let results = join_all(probes).await;
        let healthy = results.iter().filter(|r| r.ok).count();
        info!("[MarketService] diagnose: {}/{} providers reachable", healthy, results.len());
        results
    }
}

/// Tiers to try for a given cached preference
///
/// A cached live tier is retried alone before dropping to the local tiers;
/// the rest of the live chain is only walked on a cold start.
pub fn overview_plan(cached: Option<Tier>) -> Vec<Tier> {
    let mut plan = match cached {
        Some(tier @ Tier::Feed { .. }) => vec![tier],
        Some(Tier::LocalSnapshot) | Some(Tier::Synthetic) => Vec::new(),
        None => LIVE_CHAIN
            .iter()
            .map(|&(provider, mode)| Tier::feed(provider, mode))
            .collect(),
    };
    plan.push(Tier::LocalSnapshot);
    plan.push(Tier::Synthetic);
    plan
}

/// Build a detail record from an overview entry
pub fn reconstruct_detail(entry: &CoinOverview) -> CoinDetail {
    let coin = &entry.coin;
    let price = coin.current_price;
    let supply = if price > 0.0 { coin.market_cap / price } else { 0.0 };

    let (prices, volumes) = history_from_sparkline(
        coin.sparkline(),
        price,
        coin.total_volume,
        Utc::now().timestamp_millis(),
    );

    let market_data = DetailMarketData {
        current_price: UsdAmount::new(price),
        market_cap: UsdAmount::new(coin.market_cap),
        total_volume: UsdAmount::new(coin.total_volume),
        price_change_percentage_24h: coin.price_change_percentage_24h,
        high_24h: UsdAmount::new(price * (1.0 + RECONSTRUCTED_RANGE)),
        low_24h: UsdAmount::new(price * (1.0 - RECONSTRUCTED_RANGE)),
        circulating_supply: supply,
        total_supply: supply,
    };

    CoinDetail::new(
        coin.id.clone(),
        coin.symbol.clone(),
        coin.name.clone(),
        entry.insight.clone(),
        market_data,
        prices,
        volumes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use intel_core::{Recommendation, Sparkline};

    #[test]
    fn test_cold_plan_walks_every_live_tier() {
        let plan = overview_plan(None);
        assert_eq!(plan.len(), LIVE_CHAIN.len() + 2);
        assert_eq!(plan[0], Tier::feed(Provider::CryptoCompare, FetchMode::Full));
        assert_eq!(plan[3], Tier::feed(Provider::CoinGecko, FetchMode::Reduced));
        assert_eq!(plan[plan.len() - 1], Tier::Synthetic);
    }

    #[test]
    fn test_cached_plan_skips_other_live_tiers() {
        let cached = Tier::feed(Provider::CoinCap, FetchMode::Full);
        assert_eq!(
            overview_plan(Some(cached)),
            vec![cached, Tier::LocalSnapshot, Tier::Synthetic]
        );
        assert_eq!(
            overview_plan(Some(Tier::Synthetic)),
            vec![Tier::LocalSnapshot, Tier::Synthetic]
        );
    }

    #[test]
    fn test_reconstruct_detail() {
        let entry = CoinOverview {
            coin: NormalizedCoin {
                id: "solana".to_string(),
                symbol: "sol".to_string(),
                name: "Solana".to_string(),
                current_price: 100.0,
                price_change_percentage_24h: 2.0,
                market_cap: 4.0e10,
                total_volume: 2.0e9,
                sparkline_in_7d: Some(Sparkline::new(vec![90.0, 92.0, 94.0, 96.0, 98.0, 99.0, 100.0])),
            },
            score: 0.6,
            recommendation: Recommendation::Hold,
            insight: "Gained 2.00% in 24h.".to_string(),
        };

        let detail = reconstruct_detail(&entry);
        assert_eq!(detail.description, "Gained 2.00% in 24h.");
        assert!((detail.market_data.high_24h.usd - 105.0).abs() < 1e-9);
        assert!((detail.market_data.low_24h.usd - 95.0).abs() < 1e-9);
        assert_eq!(detail.market_data.circulating_supply, 4.0e8);
        assert_eq!(detail.prices.len(), 30);
        assert_eq!(detail.prices[0].1, 90.0);
    }
}
