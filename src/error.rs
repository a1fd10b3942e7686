// Error taxonomy for the tour-booking API client.

use thiserror::Error;

/// Failures surfaced by the HTTP client and everything layered on top of it.
///
/// Cloneable so that coalesced readers waiting on one shared in-flight
/// request can each receive the same failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// The server answered 401. The session store has already been cleared
    /// and the auth-expired handler notified by the time callers see this.
    #[error("Session expired")]
    AuthExpired,

    /// Any non-2xx response other than 401, carrying the server-provided
    /// message verbatim.
    #[error("API error: {status_code} - {message}")]
    Response { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Response { status_code, .. } => Some(*status_code),
            ApiError::AuthExpired => Some(401),
            _ => None,
        }
    }

    /// Human-readable message suitable for direct display.
    pub fn message(&self) -> String {
        match self {
            ApiError::Response { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Network-level failures (no response received) are the only ones a
    /// caller may reasonably retry. The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout(_))
    }
}

// Errors raised while constructing a client, before any request is made.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_error_exposes_status_and_message() {
        let err = ApiError::Response {
            status_code: 400,
            message: "Cannot cancel completed booking".to_string(),
        };
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(err.message(), "Cannot cancel completed booking");
        assert!(!err.is_retryable());
    }

    #[test]
    fn network_failures_are_retryable() {
        assert!(ApiError::Network("connection refused".into()).is_retryable());
        assert!(ApiError::Timeout(10_000).is_retryable());
        assert!(!ApiError::AuthExpired.is_retryable());
    }

    #[test]
    fn auth_expired_maps_to_401() {
        assert_eq!(ApiError::AuthExpired.status_code(), Some(401));
    }
}
