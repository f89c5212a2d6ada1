//! Error types for the GitHub client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the GitHub API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The app private key could not be loaded or used to sign
    #[error("Invalid app key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if the API rejected the credential (401)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::ApiError { status: 401, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_401_is_unauthorized() {
        assert!(ClientError::api_error(401, "Bad credentials").is_unauthorized());
        assert!(!ClientError::api_error(403, "Forbidden").is_unauthorized());
        assert!(!ClientError::api_error(404, "Not Found").is_unauthorized());
        assert!(!ClientError::api_error(503, "Service Unavailable").is_unauthorized());
    }

    #[test]
    fn test_parse_error_is_not_unauthorized() {
        let err = ClientError::ParseError("eof".to_string());
        assert!(!err.is_unauthorized());
    }
}
