//! Agent error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Extraction and repair were both exhausted on the model's output.
    /// Carries the offending text for diagnostics.
    #[error("Malformed model response: {message}")]
    MalformedResponse { message: String, raw: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Check if this error is worth retrying at the transport layer
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::RateLimited { .. } => true,
            AgentError::Api { status, .. } => *status >= 500,
            AgentError::Network(_) => true,
            AgentError::MalformedResponse { .. } => false,
            AgentError::Json(_) => false,
            AgentError::InvalidResponse(_) => false,
            AgentError::Config(_) => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AgentError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
