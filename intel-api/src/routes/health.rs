//! Health and diagnostics endpoints

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use intel_core::Tier;
use intel_services::ProbeResult;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    /// Tier that served the last overview, null before the first one
    tier: Option<Tier>,
}

/// Provider probe response
#[derive(Debug, Serialize)]
struct DiagnoseResponse {
    timestamp: DateTime<Utc>,
    tests: Vec<ProbeResult>,
}

/// Health check handler
///
/// Serving from a fallback tier is reported as degraded but still answers
/// 200, since every endpoint keeps returning usable data.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let tier = state.market.current_tier();
    let status = match tier {
        Some(t) if !t.is_live() => "degraded",
        _ => "healthy",
    };

    Json(HealthResponse {
        status,
        timestamp: Utc::now(),
        tier,
    })
}

/// Probe every provider
async fn diagnose(State(state): State<AppState>) -> Json<DiagnoseResponse> {
    Json(DiagnoseResponse {
        timestamp: Utc::now(),
        tests: state.market.diagnose().await,
    })
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/diagnose", get(diagnose))
}
