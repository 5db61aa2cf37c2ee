//! Crypto Market Intel API Server
//!
//! HTTP API server that aggregates market data from five providers with
//! local snapshot and synthetic fallbacks.

mod config;
mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use config::ApiConfig;
use intel_core::Provider;
use intel_feeds::{build_feeds, FeedConfig};
use intel_services::{LocalSnapshotStore, MarketService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<MarketService>,
}

/// Router with every API route and the shared layers
pub fn app(state: AppState) -> Router {
    // Read-only API, any origin may call it
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,intel_api=debug")),
        )
        .init();

    info!("Starting Crypto Market Intel API");

    let api_config = ApiConfig::from_env()?;
    let feed_config = FeedConfig::from_env()?;

    for provider in Provider::ALL.iter().filter(|p| p.requires_key()) {
        let configured = match provider {
            Provider::CryptoCompare => feed_config.cryptocompare_api_key.is_some(),
            Provider::CoinMarketCap => feed_config.coinmarketcap_api_key.is_some(),
            _ => true,
        };
        if configured {
            info!("{} API key found in environment", provider.display_name());
        } else {
            warn!(
                "No {} API key configured - that tier will be skipped",
                provider.display_name()
            );
        }
    }

    info!("Using local snapshot at: {}", api_config.snapshot_path.display());
    let snapshot = LocalSnapshotStore::new(&api_config.snapshot_path);
    let market = MarketService::new(build_feeds(&feed_config), snapshot);

    let state = AppState {
        market: Arc::new(market),
    };

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], api_config.port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
