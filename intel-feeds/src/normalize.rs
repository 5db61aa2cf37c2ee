//! Provider payload normalization
//!
//! Maps any provider's raw listing records onto [`NormalizedCoin`]. Records
//! that cannot be mapped or that break the record invariants are dropped
//! quietly; only a payload with no recognizable structure at all is an
//! error.

use crate::feed::RawPayload;
use crate::types::{BinanceTicker, CcListingEntry, CmcListingEntry, CoinCapAsset, CoinGeckoMarket};
use intel_core::{NormalizationError, NormalizedCoin, Provider};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Normalize a live provider payload
pub fn normalize(payload: &RawPayload) -> Result<Vec<NormalizedCoin>, NormalizationError> {
    normalize_records(payload.provider, &payload.records)
}

/// Normalize records of a known provider shape
pub fn normalize_records(
    provider: Provider,
    records: &[Value],
) -> Result<Vec<NormalizedCoin>, NormalizationError> {
    if !records.is_empty() && !records.iter().any(Value::is_object) {
        return Err(NormalizationError::unrecognized(
            provider.id(),
            "records are not JSON objects",
        ));
    }

    let mapped = match provider {
        Provider::CryptoCompare => map_records(records, CcListingEntry::to_normalized),
        Provider::CoinMarketCap => map_records(records, CmcListingEntry::to_normalized),
        Provider::CoinGecko => map_records(records, CoinGeckoMarket::to_normalized),
        Provider::CoinCap => map_records(records, CoinCapAsset::to_normalized),
        Provider::Binance => map_records(records, BinanceTicker::to_normalized),
    };

    let coins = retain_valid(mapped);
    debug!(
        "[Normalizer] {}: kept {} of {} records",
        provider,
        coins.len(),
        records.len()
    );
    Ok(coins)
}

/// Normalize the contents of a snapshot file
///
/// The file holds raw records of whichever provider produced it, so the
/// shape is detected from the first object record.
pub fn normalize_snapshot(value: &Value) -> Result<Vec<NormalizedCoin>, NormalizationError> {
    let records = value
        .as_array()
        .ok_or_else(|| NormalizationError::unrecognized("snapshot", "expected a JSON array"))?;

    if records.is_empty() {
        return Ok(Vec::new());
    }

    let provider = records
        .iter()
        .find_map(detect_provider)
        .ok_or_else(|| NormalizationError::unrecognized("snapshot", "unknown record shape"))?;

    debug!("[Normalizer] snapshot records look like {}", provider);
    normalize_records(provider, records)
}

/// Identify which provider produced a raw record
pub fn detect_provider(record: &Value) -> Option<Provider> {
    let obj = record.as_object()?;

    if obj.contains_key("CoinInfo") {
        Some(Provider::CryptoCompare)
    } else if obj.contains_key("quote") {
        Some(Provider::CoinMarketCap)
    } else if obj.contains_key("current_price") {
        Some(Provider::CoinGecko)
    } else if obj.contains_key("priceUsd") {
        Some(Provider::CoinCap)
    } else if obj.contains_key("lastPrice") {
        Some(Provider::Binance)
    } else {
        None
    }
}

fn map_records<T, F>(records: &[Value], convert: F) -> Vec<NormalizedCoin>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Option<NormalizedCoin>,
{
    records
        .iter()
        .filter_map(|record| T::deserialize(record).ok())
        .filter_map(|raw| convert(&raw))
        .collect()
}

/// Drop invalid records and repeated ids (first occurrence wins)
fn retain_valid(coins: Vec<NormalizedCoin>) -> Vec<NormalizedCoin> {
    let mut seen = HashSet::new();
    coins
        .into_iter()
        .filter(NormalizedCoin::is_valid)
        .filter(|coin| seen.insert(coin.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gecko(id: &str, price: f64) -> Value {
        json!({
            "id": id, "symbol": id, "name": id,
            "current_price": price, "price_change_percentage_24h": 1.0,
            "market_cap": 1.0e9, "total_volume": 1.0e8
        })
    }

    #[test]
    fn test_drops_invalid_records_silently() {
        let payload = RawPayload::new(
            Provider::CoinGecko,
            vec![
                gecko("bitcoin", 45000.0),
                gecko("zero", 0.0),
                json!({"id": "no-price", "symbol": "np", "name": "No Price", "market_cap": 1.0, "total_volume": 1.0}),
                json!({"garbage": true}),
            ],
        );

        let coins = normalize(&payload).unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].id, "bitcoin");
    }

    #[test]
    fn test_missing_market_cap_is_dropped() {
        let record = json!({
            "id": "thin", "symbol": "thn", "name": "Thin",
            "current_price": 1.0, "market_cap": null, "total_volume": 0.0
        });
        let coins = normalize_records(Provider::CoinGecko, &[record]).unwrap();
        assert!(coins.is_empty());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let coins =
            normalize_records(Provider::CoinGecko, &[gecko("btc", 1.0), gecko("btc", 2.0)]).unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].current_price, 1.0);
    }

    #[test]
    fn test_non_object_records_are_unrecognized() {
        let err = normalize_records(Provider::CoinCap, &[json!(1), json!("x")]).unwrap_err();
        assert!(matches!(err, NormalizationError::Unrecognized { .. }));
    }

    #[test]
    fn test_snapshot_shape_detection() {
        let cmc = json!([{
            "slug": "ethereum", "symbol": "ETH", "name": "Ethereum",
            "quote": {"USD": {"price": 2800.0, "percent_change_24h": -2.0, "market_cap": 3.3e11, "volume_24h": 1.2e10}}
        }]);
        let coins = normalize_snapshot(&cmc).unwrap();
        assert_eq!(coins[0].id, "ethereum");

        let binance = json!([{"symbol": "BTCUSDT", "lastPrice": "45000", "priceChangePercent": "1", "quoteVolume": "5"}]);
        assert_eq!(detect_provider(&binance[0]), Some(Provider::Binance));

        assert!(normalize_snapshot(&json!({"not": "an array"})).is_err());
        assert!(normalize_snapshot(&json!([{"mystery": 1}])).is_err());
        assert!(normalize_snapshot(&json!([])).unwrap().is_empty());
    }
}
