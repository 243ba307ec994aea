//! Store error types

use thiserror::Error;

/// Errors that can occur while talking to the backing table
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("Backend auth error: {0}")]
    Auth(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Check if this error came from authenticating with the backend
    pub fn is_auth(&self) -> bool {
        match self {
            StoreError::Auth(_) | StoreError::Credentials(_) => true,
            StoreError::ApiError { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Check if this error means the backend could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth() {
        assert!(StoreError::Auth("bad grant".to_string()).is_auth());
        assert!(StoreError::Credentials("missing key".to_string()).is_auth());
        assert!(
            StoreError::ApiError {
                status: 403,
                message: "The caller does not have permission".to_string()
            }
            .is_auth()
        );
        assert!(
            !StoreError::ApiError {
                status: 400,
                message: "Unable to parse range".to_string()
            }
            .is_auth()
        );
    }

    #[test]
    fn test_is_unavailable() {
        assert!(
            StoreError::ApiError {
                status: 503,
                message: "Service unavailable".to_string()
            }
            .is_unavailable()
        );
        assert!(!StoreError::InvalidResponse("no values".to_string()).is_unavailable());
        assert!(!StoreError::Auth("expired".to_string()).is_unavailable());
    }

    #[test]
    fn test_display() {
        let err = StoreError::ApiError {
            status: 404,
            message: "Requested entity was not found.".to_string(),
        };
        assert_eq!(err.to_string(), "API error 404: Requested entity was not found.");
    }
}
