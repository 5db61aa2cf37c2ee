//! Coin detail endpoint

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use intel_core::CoinDetail;

use crate::AppState;

/// Detail for a slug or ticker; unknown coins get a stub, never an error
async fn get_coin(State(state): State<AppState>, Path(id): Path<String>) -> Json<CoinDetail> {
    Json(state.market.get_coin_detail(&id).await)
}

/// Create coin routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/coins/{id}", get(get_coin))
}
