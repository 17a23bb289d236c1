//! Error types for the sandbox core.
//!
//! Invalid user interactions are not errors (they resolve to no-ops);
//! these cover configuration, the signal bus, and the external collaborator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("envelope codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("signal bus is closed")]
    Closed,

    #[error("publish failed: {0}")]
    Publish(String),
}

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("provider returned no text")]
    Empty,
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(e: serde_json::Error) -> Self {
        CollaboratorError::Malformed(e.to_string())
    }
}
