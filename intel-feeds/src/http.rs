//! Shared HTTP plumbing for feed clients

use intel_core::{Provider, UpstreamError};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; CryptoIntel/1.0)";

/// HTTP client bound to one provider, so every failure is attributed
#[derive(Clone)]
pub(crate) struct FeedHttp {
    client: Client,
    provider: Provider,
}

impl FeedHttp {
    pub(crate) fn new(provider: Provider, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, provider }
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url).header("Accept", "application/json")
    }

    /// Send a request and decode the JSON body
    ///
    /// Transport errors, timeouts, non-2xx statuses and undecodable bodies
    /// all map to [`UpstreamError`].
    pub(crate) async fn send_json(&self, request: RequestBuilder) -> Result<Value, UpstreamError> {
        let start = Instant::now();

        let response = request.send().await.map_err(|e| {
            let kind = if e.is_timeout() { "timed out" } else { "unreachable" };
            UpstreamError::network(self.provider, format!("{}: {}", kind, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::status(self.provider, status.as_u16(), &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::malformed(self.provider, e.to_string()))?;

        debug!(
            "[{}] {} in {}ms",
            self.provider,
            status,
            start.elapsed().as_millis()
        );

        Ok(body)
    }

    /// Send a lightweight probe, ignoring the body
    pub(crate) async fn probe(&self, request: RequestBuilder) -> Result<(), UpstreamError> {
        let response = request.send().await.map_err(|e| {
            UpstreamError::network(self.provider, e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(UpstreamError::status(self.provider, status.as_u16(), &body))
        }
    }
}

/// Extract a non-empty array stored under `key` of a JSON object
pub(crate) fn array_field(
    provider: Provider,
    body: Value,
    key: &str,
) -> Result<Vec<Value>, UpstreamError> {
    match body {
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) if items.is_empty() => Err(UpstreamError::empty(provider)),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(UpstreamError::malformed(
                provider,
                format!("`{}` is not an array", key),
            )),
            None => Err(UpstreamError::malformed(
                provider,
                format!("missing `{}` field", key),
            )),
        },
        _ => Err(UpstreamError::malformed(provider, "expected a JSON object")),
    }
}

/// Accept a top-level non-empty array
pub(crate) fn top_level_array(provider: Provider, body: Value) -> Result<Vec<Value>, UpstreamError> {
    match body {
        Value::Array(items) if items.is_empty() => Err(UpstreamError::empty(provider)),
        Value::Array(items) => Ok(items),
        _ => Err(UpstreamError::malformed(provider, "expected a JSON array")),
    }
}

/// Parse a number that an API may send as a JSON string
pub(crate) fn parse_num(raw: &Option<String>) -> Option<f64> {
    raw.as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_field() {
        let items = array_field(Provider::CoinCap, json!({"data": [1, 2]}), "data").unwrap();
        assert_eq!(items.len(), 2);

        let err = array_field(Provider::CoinCap, json!({"data": []}), "data").unwrap_err();
        assert_eq!(err.message, "empty response");

        assert!(array_field(Provider::CoinCap, json!({"error": "x"}), "data").is_err());
        assert!(array_field(Provider::CoinCap, json!([1]), "data").is_err());
    }

    #[test]
    fn test_top_level_array() {
        assert!(top_level_array(Provider::Binance, json!([{}])).is_ok());
        assert!(top_level_array(Provider::Binance, json!([])).is_err());
        assert!(top_level_array(Provider::Binance, json!({"code": -1})).is_err());
    }

    #[test]
    fn test_parse_num() {
        assert_eq!(parse_num(&Some("45000.5".to_string())), Some(45000.5));
        assert_eq!(parse_num(&Some(" 1e3 ".to_string())), Some(1000.0));
        assert_eq!(parse_num(&Some("abc".to_string())), None);
        assert_eq!(parse_num(&Some("NaN".to_string())), None);
        assert_eq!(parse_num(&None), None);
    }
}
