//! Core types for the crypto market intel service
//!
//! This crate defines the shared data structures used across the service,
//! including the normalized coin record, derived overview, coin detail and
//! the identities of the upstream data tiers.

pub mod coin;
pub mod detail;
pub mod error;
pub mod tier;

pub use coin::{CoinOverview, NormalizedCoin, Recommendation, Sparkline, SPARKLINE_POINTS};
pub use detail::{CoinDetail, DetailMarketData, SeriesPoint, UsdAmount};
pub use error::{IntelError, IntelResult, NormalizationError, SnapshotUnavailable, UpstreamError};
pub use tier::{FetchMode, Provider, Tier};
