//! API route definitions

mod coins;
mod health;
mod overview;

use axum::Router;
use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(overview::routes())
        .merge(coins::routes())
        .merge(health::routes())
}

#[cfg(test)]
mod tests {
    use crate::{app, AppState};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use intel_services::{LocalSnapshotStore, MarketService};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// No feeds and no snapshot, so every answer comes from synthetic data
    fn offline_state() -> AppState {
        let snapshot = std::env::temp_dir()
            .join(format!("intel-api-{}", std::process::id()))
            .join("absent.json");
        AppState {
            market: Arc::new(MarketService::new(Vec::new(), LocalSnapshotStore::new(snapshot))),
        }
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = app(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_overview_is_never_empty() {
        let (status, body) = get_json(offline_state(), "/api/overview?force=true").await;

        assert_eq!(status, StatusCode::OK);
        let coins = body.as_array().unwrap();
        assert_eq!(coins.len(), 50);

        let first = &coins[0];
        for key in ["id", "symbol", "name", "current_price", "score", "recommendation", "insight"] {
            assert!(first.get(key).is_some(), "missing {}", key);
        }
    }

    #[tokio::test]
    async fn test_unknown_coin_is_a_stub() {
        let (status, body) = get_json(offline_state(), "/api/coins/not-a-real-coin").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "not-a-real-coin");
        assert_eq!(body["market_data"]["current_price"]["usd"], 0.0);
    }

    #[tokio::test]
    async fn test_known_coin_is_reconstructed() {
        let (status, body) = get_json(offline_state(), "/api/coins/bitcoin").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "btc");
        assert!(body["market_data"]["current_price"]["usd"].as_f64().unwrap() > 0.0);
        assert_eq!(body["prices"].as_array().unwrap().len(), 30);
    }

    #[tokio::test]
    async fn test_health_reports_tier() {
        let state = offline_state();

        let (_, before) = get_json(state.clone(), "/api/health").await;
        assert_eq!(before["status"], "healthy");
        assert!(before["tier"].is_null());

        get_json(state.clone(), "/api/overview").await;
        let (status, after) = get_json(state, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(after["status"], "degraded");
        assert_eq!(after["tier"], "synthetic");
    }

    #[tokio::test]
    async fn test_diagnose_shape() {
        let (status, body) = get_json(offline_state(), "/api/diagnose").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["timestamp"].is_string());
        assert!(body["tests"].as_array().unwrap().is_empty());
    }
}
