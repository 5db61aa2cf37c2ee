//! Upstream provider and fallback tier identities

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Supported upstream market-data providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// CryptoCompare - keyed, top coins by market cap
    CryptoCompare,
    /// CoinMarketCap - keyed, latest listings
    CoinMarketCap,
    /// CoinGecko - free, optional 7 day sparkline
    CoinGecko,
    /// CoinCap - free, no sparkline
    CoinCap,
    /// Binance - free spot tickers, market cap is estimated
    Binance,
}

impl Provider {
    /// Every provider in cold-start priority order
    pub const ALL: [Provider; 5] = [
        Provider::CryptoCompare,
        Provider::CoinMarketCap,
        Provider::CoinGecko,
        Provider::CoinCap,
        Provider::Binance,
    ];

    /// Lowercase identifier used in logs, config and JSON
    pub fn id(&self) -> &'static str {
        match self {
            Provider::CryptoCompare => "cryptocompare",
            Provider::CoinMarketCap => "coinmarketcap",
            Provider::CoinGecko => "coingecko",
            Provider::CoinCap => "coincap",
            Provider::Binance => "binance",
        }
    }

    /// Get the full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::CryptoCompare => "CryptoCompare",
            Provider::CoinMarketCap => "CoinMarketCap",
            Provider::CoinGecko => "CoinGecko",
            Provider::CoinCap => "CoinCap",
            Provider::Binance => "Binance",
        }
    }

    /// Whether the provider needs a static API key
    pub fn requires_key(&self) -> bool {
        matches!(self, Provider::CryptoCompare | Provider::CoinMarketCap)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cryptocompare" | "cc" => Ok(Provider::CryptoCompare),
            "coinmarketcap" | "cmc" => Ok(Provider::CoinMarketCap),
            "coingecko" | "cg" => Ok(Provider::CoinGecko),
            "coincap" => Ok(Provider::CoinCap),
            "binance" => Ok(Provider::Binance),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// How much data a listing request asks for
///
/// Only CoinGecko distinguishes the two; the reduced mode skips the
/// sparkline so the response is smaller and faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    #[default]
    Full,
    Reduced,
}

/// One step of the overview fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// A live upstream API queried in a specific mode
    Feed { provider: Provider, mode: FetchMode },
    /// The on-disk snapshot of a previous upstream response
    LocalSnapshot,
    /// Generated data, always available
    Synthetic,
}

impl Tier {
    pub fn feed(provider: Provider, mode: FetchMode) -> Self {
        Tier::Feed { provider, mode }
    }

    /// Stable label, e.g. `coingecko`, `coingecko-lite`, `local-snapshot`
    pub fn label(&self) -> String {
        match self {
            Tier::Feed {
                provider,
                mode: FetchMode::Full,
            } => provider.id().to_string(),
            Tier::Feed {
                provider,
                mode: FetchMode::Reduced,
            } => format!("{}-lite", provider.id()),
            Tier::LocalSnapshot => "local-snapshot".to_string(),
            Tier::Synthetic => "synthetic".to_string(),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Tier::Feed { .. })
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trips_through_id() {
        for provider in Provider::ALL {
            assert_eq!(provider.id().parse::<Provider>().unwrap(), provider);
        }
        assert!("kraken".parse::<Provider>().is_err());
    }

    #[test]
    fn test_only_two_providers_need_keys() {
        let keyed: Vec<_> = Provider::ALL.iter().filter(|p| p.requires_key()).collect();
        assert_eq!(keyed, vec![&Provider::CryptoCompare, &Provider::CoinMarketCap]);
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(Tier::feed(Provider::CoinGecko, FetchMode::Full).label(), "coingecko");
        assert_eq!(
            Tier::feed(Provider::CoinGecko, FetchMode::Reduced).label(),
            "coingecko-lite"
        );
        assert_eq!(Tier::LocalSnapshot.label(), "local-snapshot");
        assert_eq!(
            serde_json::to_string(&Tier::Synthetic).unwrap(),
            "\"synthetic\""
        );
    }
}
