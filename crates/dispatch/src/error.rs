//! Error types for transport adapters.

use thiserror::Error;

/// Errors a transport adapter can raise. Never propagated to a dispatcher
/// caller — every send is caught and turned into a `false` result entry
/// (§4.B: "Never raises to callers; transport errors become `false`
/// entries").
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel not configured: {0}")]
    NotConfigured(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
