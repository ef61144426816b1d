//! Error taxonomy for language model provider calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling a text-generation provider.
#[derive(Error, Debug)]
pub enum LlmApiError {
    /// Invalid request parameters or malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed due to an invalid or missing API key.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded; retry after waiting.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider encountered an internal error.
    #[error("API server error: {0}")]
    ServerError(String),

    /// Network error during the request.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization or deserialization error.
    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out waiting for a response.
    #[error("Timeout waiting for response")]
    Timeout,

    /// The provider answered but produced no usable text.
    #[error("Provider returned no text content")]
    EmptyReply,

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl LlmApiError {
    /// Whether the error is transient and worth retrying.
    ///
    /// Rate limits, server-side failures and timeouts are transient; bad
    /// requests and bad credentials are not; retrying those just burns the
    /// backoff budget.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded | Self::ServerError(_) | Self::Timeout => true,
            Self::NetworkError(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }

    /// Map an HTTP status code and response body to an error variant.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => Self::InvalidRequest(body),
            401 | 403 => Self::AuthenticationFailed(body),
            429 => Self::RateLimitExceeded,
            500..=599 => Self::ServerError(body),
            code => Self::Unknown(format!("HTTP {code}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_codes() {
        assert!(matches!(
            LlmApiError::from_status(StatusCode::BAD_REQUEST, String::new()),
            LlmApiError::InvalidRequest(_)
        ));
        assert!(matches!(
            LlmApiError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            LlmApiError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            LlmApiError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            LlmApiError::RateLimitExceeded
        ));
        assert!(matches!(
            LlmApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, String::new()),
            LlmApiError::ServerError(_)
        ));
    }

    #[test]
    fn only_transient_errors_retry() {
        assert!(LlmApiError::RateLimitExceeded.is_transient());
        assert!(LlmApiError::ServerError("boom".into()).is_transient());
        assert!(LlmApiError::Timeout.is_transient());
        assert!(!LlmApiError::InvalidRequest("bad".into()).is_transient());
        assert!(!LlmApiError::AuthenticationFailed("no".into()).is_transient());
        assert!(!LlmApiError::EmptyReply.is_transient());
    }
}
