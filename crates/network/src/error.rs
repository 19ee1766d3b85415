// crates/network/src/error.rs
//! Error types for network operations

use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Whole request exceeded the configured timeout
    #[error("Operation timed out")]
    Timeout,
}

impl NetworkError {
    /// Returns true if the error is worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Timeout => true,
            NetworkError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            NetworkError::Status { status, .. } => *status >= 500,
            NetworkError::InvalidUrl(_) => false,
        }
    }

    /// Returns true if the server reported a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, NetworkError::Status { status, .. } if (400..500).contains(status))
    }

    /// Returns true if the server reported a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self, NetworkError::Status { status, .. } if *status >= 500)
    }
}

impl From<dreamfm_resilience::ResilienceError> for NetworkError {
    fn from(err: dreamfm_resilience::ResilienceError) -> Self {
        match err {
            dreamfm_resilience::ResilienceError::Timeout(_) => NetworkError::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> NetworkError {
        NetworkError::Status {
            url: "http://localhost/x".to_string(),
            status: code,
        }
    }

    #[test]
    fn test_error_display() {
        let err = NetworkError::InvalidUrl("test".to_string());
        assert!(err.to_string().contains("Invalid URL"));
        assert_eq!(status(404).to_string(), "HTTP 404 for http://localhost/x");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(NetworkError::Timeout.is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!NetworkError::InvalidUrl("test".to_string()).is_retryable());
    }

    #[test]
    fn test_status_classes() {
        assert!(status(404).is_client_error());
        assert!(!status(404).is_server_error());
        assert!(status(500).is_server_error());
    }

    #[test]
    fn test_from_resilience_timeout() {
        let err: NetworkError =
            dreamfm_resilience::ResilienceError::Timeout(std::time::Duration::from_secs(1)).into();
        assert!(matches!(err, NetworkError::Timeout));
    }
}
