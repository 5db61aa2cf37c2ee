//! Market overview endpoint

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use intel_core::CoinOverview;
use serde::Deserialize;
use tracing::info;

use crate::AppState;

/// Query parameters for the overview
#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    /// Re-probe providers from the top of the chain
    pub force: Option<String>,
    /// Alias of `force`
    pub refresh: Option<String>,
}

impl OverviewQuery {
    fn wants_refresh(&self) -> bool {
        [&self.force, &self.refresh]
            .into_iter()
            .flatten()
            .any(|v| v.eq_ignore_ascii_case("true") || v == "1")
    }
}

/// Top coins with scores, recommendations and insights
async fn get_overview(
    State(state): State<AppState>,
    Query(params): Query<OverviewQuery>,
) -> Json<Vec<CoinOverview>> {
    if params.wants_refresh() {
        info!("[API] overview refresh requested");
        state.market.set_force_refresh(true);
    }
    Json(state.market.get_market_overview().await)
}

/// Create overview routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/overview", get(get_overview))
}
