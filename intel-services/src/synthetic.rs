//! Synthetic market data
//!
//! Last-resort tier. Prices random-walk from the previous call's price so a
//! polling client sees smooth movement instead of fresh noise each time.

use chrono::{DateTime, Utc};
use intel_core::{NormalizedCoin, Sparkline, SPARKLINE_POINTS};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

/// Smallest price the walk may reach
const PRICE_FLOOR: f64 = 0.0001;

/// Per-call move, as a fraction of the last price
const MIN_STEP: f64 = 0.01;
const MAX_STEP: f64 = 0.03;

/// A seeded coin with its fixed reference price
#[derive(Debug, Clone, Copy)]
pub struct SeedCoin {
    pub id: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub base_price: f64,
}

const fn seed(id: &'static str, symbol: &'static str, name: &'static str, base_price: f64) -> SeedCoin {
    SeedCoin {
        id,
        symbol,
        name,
        base_price,
    }
}

pub const SEED_COINS: [SeedCoin; 50] = [
    seed("bitcoin", "btc", "Bitcoin", 45000.0),
    seed("ethereum", "eth", "Ethereum", 2800.0),
    seed("binancecoin", "bnb", "BNB", 320.0),
    seed("solana", "sol", "Solana", 95.0),
    seed("cardano", "ada", "Cardano", 0.55),
    seed("ripple", "xrp", "XRP", 0.62),
    seed("polkadot", "dot", "Polkadot", 7.2),
    seed("dogecoin", "doge", "Dogecoin", 0.08),
    seed("avalanche", "avax", "Avalanche", 38.0),
    seed("chainlink", "link", "Chainlink", 14.5),
    seed("polygon", "matic", "Polygon", 0.85),
    seed("litecoin", "ltc", "Litecoin", 72.0),
    seed("uniswap", "uni", "Uniswap", 6.5),
    seed("ethereum-classic", "etc", "Ethereum Classic", 25.0),
    seed("stellar", "xlm", "Stellar", 0.12),
    seed("cosmos", "atom", "Cosmos", 9.8),
    seed("algorand", "algo", "Algorand", 0.18),
    seed("vechain", "vet", "VeChain", 0.035),
    seed("filecoin", "fil", "Filecoin", 5.2),
    seed("tron", "trx", "TRON", 0.11),
    seed("monero", "xmr", "Monero", 165.0),
    seed("eos", "eos", "EOS", 0.75),
    seed("aave", "aave", "Aave", 88.0),
    seed("theta", "theta", "Theta Network", 1.05),
    seed("crypto-com-chain", "cro", "Crypto.com Coin", 0.095),
    seed("hedera-hashgraph", "hbar", "Hedera", 0.075),
    seed("tezos", "xtz", "Tezos", 0.95),
    seed("elrond-erd-2", "egld", "MultiversX", 42.0),
    seed("the-graph", "grt", "The Graph", 0.15),
    seed("helium", "hnt", "Helium", 4.8),
    seed("fantom", "ftm", "Fantom", 0.35),
    seed("near", "near", "NEAR Protocol", 3.2),
    seed("decentraland", "mana", "Decentraland", 0.45),
    seed("gala", "gala", "Gala", 0.025),
    seed("axie-infinity", "axs", "Axie Infinity", 7.8),
    seed("the-sandbox", "sand", "The Sandbox", 0.42),
    seed("chiliz", "chz", "Chiliz", 0.085),
    seed("enjin-coin", "enj", "Enjin Coin", 0.32),
    seed("flow", "flow", "Flow", 0.75),
    seed("wax", "waxp", "WAX", 0.055),
    seed("immutable-x", "imx", "Immutable X", 1.25),
    seed("loopring", "lrc", "Loopring", 0.22),
    seed("zilliqa", "zil", "Zilliqa", 0.021),
    seed("waves", "waves", "Waves", 2.5),
    seed("dash", "dash", "Dash", 32.0),
    seed("maker", "mkr", "Maker", 2100.0),
    seed("compound-governance-token", "comp", "Compound", 52.0),
    seed("yearn-finance", "yfi", "yearn.finance", 6800.0),
    seed("sushi", "sushi", "SushiSwap", 1.15),
    seed("synthetix-network-token", "snx", "Synthetix", 2.8),
];

impl SeedCoin {
    /// Rough circulating supply bucketed by price tier
    pub fn supply(&self) -> f64 {
        if self.base_price > 1000.0 {
            2.0e7
        } else if self.base_price > 100.0 {
            5.0e7
        } else if self.base_price > 1.0 {
            1.0e8
        } else {
            5.0e8
        }
    }
}

/// Last generated price of a coin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub last_price: f64,
    pub last_timestamp: DateTime<Utc>,
}

/// Generates plausible, continuous market data for the seed list
#[derive(Debug, Default)]
pub struct SyntheticDataGenerator {
    continuity: Mutex<HashMap<&'static str, PricePoint>>,
}

impl SyntheticDataGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate one dataset covering every seed coin
    pub fn generate(&self) -> Vec<NormalizedCoin> {
        let now = Utc::now();
        let mut rng = rand::rng();
        let mut cache = self.continuity.lock();

        let coins: Vec<NormalizedCoin> = SEED_COINS
            .iter()
            .map(|seed| {
                let last_price = cache
                    .get(seed.id)
                    .map(|p| p.last_price)
                    .unwrap_or(seed.base_price);
                let coin = synthesize(seed, last_price, &mut rng);
                cache.insert(
                    seed.id,
                    PricePoint {
                        last_price: coin.current_price,
                        last_timestamp: now,
                    },
                );
                coin
            })
            .collect();

        debug!("[Synthetic] generated {} coins", coins.len());
        coins
    }

    /// Last generated price for a coin, if any
    pub fn last_price(&self, id: &str) -> Option<PricePoint> {
        self.continuity.lock().get(id).copied()
    }
}

fn synthesize(seed: &SeedCoin, last_price: f64, rng: &mut impl Rng) -> NormalizedCoin {
    let step = rng.random_range(MIN_STEP..=MAX_STEP);
    let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let current_price = (last_price * (1.0 + step * direction)).max(PRICE_FLOOR);

    let change_24h = (current_price - seed.base_price) / seed.base_price * 100.0;
    let market_cap = current_price * seed.supply();
    let total_volume = market_cap * rng.random_range(0.05..=0.15);

    // Older points wander further from the current price
    let sparkline = (0..SPARKLINE_POINTS)
        .map(|i| {
            let days_ago = (SPARKLINE_POINTS - 1 - i) as f64;
            let variation = (rng.random::<f64>() - 0.5) * 0.1 * (1.0 + days_ago * 0.1);
            (current_price * (1.0 + variation)).max(PRICE_FLOOR)
        })
        .collect();

    NormalizedCoin {
        id: seed.id.to_string(),
        symbol: seed.symbol.to_string(),
        name: seed.name.to_string(),
        current_price,
        price_change_percentage_24h: change_24h,
        market_cap,
        total_volume,
        sparkline_in_7d: Some(Sparkline::new(sparkline)),
    }
}
