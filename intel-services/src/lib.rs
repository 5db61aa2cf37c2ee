//! Business logic services for the crypto market intel service
//!
//! This crate turns raw feeds into the overview and detail views: tiered
//! fallback across providers, the local snapshot and synthetic data, plus
//! the analytics applied to whichever tier answered.

pub mod analytics;
pub mod fallback;
pub mod market_service;
pub mod snapshot;
pub mod synthetic;

pub use analytics::{AnalyticsEngine, Signals};
pub use fallback::{first_success, Attempt};
pub use market_service::{MarketService, ProbeResult};
pub use snapshot::LocalSnapshotStore;
pub use synthetic::SyntheticDataGenerator;
