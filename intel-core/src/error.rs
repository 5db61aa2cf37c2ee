//! Error types for the intel service
//!
//! Every kind here is recovered inside the service layer; none of them
//! crosses the overview/detail boundary.

use crate::tier::Provider;
use thiserror::Error;

/// Longest upstream body excerpt kept in an error message
const BODY_EXCERPT_LEN: usize = 200;

/// A single provider call failed
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{provider} error: {message}")]
pub struct UpstreamError {
    pub provider: Provider,
    pub http_status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(provider: Provider, message: impl Into<String>) -> Self {
        Self {
            provider,
            http_status: None,
            message: message.into(),
        }
    }

    /// Transport failure or timeout
    pub fn network(provider: Provider, msg: impl Into<String>) -> Self {
        Self::new(provider, format!("request failed: {}", msg.into()))
    }

    /// Non-success HTTP status
    pub fn status(provider: Provider, status: u16, body: &str) -> Self {
        let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
        Self {
            provider,
            http_status: Some(status),
            message: format!("HTTP {}: {}", status, excerpt),
        }
    }

    /// Body did not have the expected shape
    pub fn malformed(provider: Provider, msg: impl Into<String>) -> Self {
        Self::new(provider, format!("malformed response: {}", msg.into()))
    }

    /// Body parsed but carried no records
    pub fn empty(provider: Provider) -> Self {
        Self::new(provider, "empty response")
    }

    /// Keyed provider configured without a key
    pub fn missing_key(provider: Provider) -> Self {
        Self::new(provider, "API key not configured")
    }

    /// Operation the provider does not offer
    pub fn unsupported(provider: Provider, what: &str) -> Self {
        Self::new(provider, format!("{} not supported", what))
    }
}

/// A payload whose overall shape is not recognizable at all
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationError {
    #[error("unrecognized {origin} payload: {reason}")]
    Unrecognized { origin: String, reason: String },
}

impl NormalizationError {
    pub fn unrecognized(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        NormalizationError::Unrecognized {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}

/// The local snapshot tier cannot serve data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotUnavailable {
    #[error("snapshot file not found: {0}")]
    Missing(String),

    #[error("snapshot file unreadable: {0}")]
    Unreadable(String),

    #[error("snapshot file malformed: {0}")]
    Malformed(String),

    #[error("snapshot contains no usable records")]
    Empty,
}

/// Service-wide error type
#[derive(Error, Debug)]
pub enum IntelError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotUnavailable),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntelError {
    pub fn config(msg: impl Into<String>) -> Self {
        IntelError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        IntelError::Internal(msg.into())
    }
}

/// Result type alias for service operations
pub type IntelResult<T> = Result<T, IntelError>;
