//! Transport error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur talking to the chat API
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {code}: {description}")]
    ApiError { code: u16, description: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransportError {
    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TransportError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Errors that cannot go away by polling again (bad token, bot blocked)
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::ApiError { code: 401 | 404, .. })
    }
}
