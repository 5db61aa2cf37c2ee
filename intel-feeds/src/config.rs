//! Upstream feed configuration

use intel_core::IntelError;
use std::env;
use std::time::Duration;

pub const CRYPTOCOMPARE_API_BASE: &str = "https://min-api.cryptocompare.com/data";
pub const COINMARKETCAP_API_BASE: &str = "https://pro-api.coinmarketcap.com/v1";
pub const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";
pub const COINCAP_API_BASE: &str = "https://api.coincap.io/v2";
pub const BINANCE_API_BASE: &str = "https://api.binance.com/api/v3";

/// Per-request timeout bounds (seconds)
const MIN_TIMEOUT_SECS: u64 = 15;
const MAX_TIMEOUT_SECS: u64 = 20;

/// Timeout for connectivity probes
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a single sparkline history request
pub const SPARKLINE_TIMEOUT: Duration = Duration::from_secs(8);

/// Configuration shared by every feed client
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub cryptocompare_api_key: Option<String>,
    pub coinmarketcap_api_key: Option<String>,
    pub cryptocompare_base_url: String,
    pub coinmarketcap_base_url: String,
    pub coingecko_base_url: String,
    pub coincap_base_url: String,
    pub binance_base_url: String,
    /// Request timeout applied to every upstream call
    pub timeout: Duration,
    /// Number of coins requested from listing endpoints
    pub listing_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cryptocompare_api_key: None,
            coinmarketcap_api_key: None,
            cryptocompare_base_url: CRYPTOCOMPARE_API_BASE.to_string(),
            coinmarketcap_base_url: COINMARKETCAP_API_BASE.to_string(),
            coingecko_base_url: COINGECKO_API_BASE.to_string(),
            coincap_base_url: COINCAP_API_BASE.to_string(),
            binance_base_url: BINANCE_API_BASE.to_string(),
            timeout: Duration::from_secs(MAX_TIMEOUT_SECS),
            listing_limit: 50,
        }
    }
}

impl FeedConfig {
    /// Load feed configuration from environment variables
    ///
    /// Reads:
    /// - CRYPTOCOMPARE_API_KEY / COINMARKETCAP_API_KEY (optional)
    /// - {CRYPTOCOMPARE,COINMARKETCAP,COINGECKO,COINCAP,BINANCE}_BASE_URL (optional)
    /// - FEED_TIMEOUT_SECS (clamped to 15..=20)
    /// - FEED_LISTING_LIMIT
    pub fn from_env() -> Result<Self, IntelError> {
        let defaults = Self::default();

        let timeout_secs = match non_empty_var("FEED_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| IntelError::config(format!("FEED_TIMEOUT_SECS: {}", e)))?,
            None => defaults.timeout.as_secs(),
        };

        let listing_limit = match non_empty_var("FEED_LISTING_LIMIT") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|e| IntelError::config(format!("FEED_LISTING_LIMIT: {}", e)))?,
            None => defaults.listing_limit,
        };

        if listing_limit == 0 {
            return Err(IntelError::config("FEED_LISTING_LIMIT must be positive"));
        }

        Ok(Self {
            cryptocompare_api_key: non_empty_var("CRYPTOCOMPARE_API_KEY"),
            coinmarketcap_api_key: non_empty_var("COINMARKETCAP_API_KEY"),
            cryptocompare_base_url: non_empty_var("CRYPTOCOMPARE_BASE_URL")
                .unwrap_or(defaults.cryptocompare_base_url),
            coinmarketcap_base_url: non_empty_var("COINMARKETCAP_BASE_URL")
                .unwrap_or(defaults.coinmarketcap_base_url),
            coingecko_base_url: non_empty_var("COINGECKO_BASE_URL")
                .unwrap_or(defaults.coingecko_base_url),
            coincap_base_url: non_empty_var("COINCAP_BASE_URL")
                .unwrap_or(defaults.coincap_base_url),
            binance_base_url: non_empty_var("BINANCE_BASE_URL")
                .unwrap_or(defaults.binance_base_url),
            timeout: clamp_timeout(timeout_secs),
            listing_limit,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeedConfig::default();
        assert_eq!(config.listing_limit, 50);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert!(config.cryptocompare_api_key.is_none());
        assert_eq!(config.coingecko_base_url, COINGECKO_API_BASE);
    }

    #[test]
    fn test_timeout_is_clamped() {
        assert_eq!(clamp_timeout(1), Duration::from_secs(15));
        assert_eq!(clamp_timeout(18), Duration::from_secs(18));
        assert_eq!(clamp_timeout(120), Duration::from_secs(20));
    }
}
