//! Error types and result aliases for gemdex operations.
//!
//! Provides a unified error type covering local validation, HTTP response
//! classification, transport failures, and retry exhaustion.

use thiserror::Error;

/// Unified error type for all gemdex operations
#[derive(Error, Debug)]
pub enum GemdexError {
    // Local validation errors
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    // HTTP response errors
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    #[error("Unauthorized request to {url}")]
    Unauthorized { url: String },

    #[error("Rate limited by {url}")]
    RateLimited { url: String },

    #[error("Server error {status} from {url}")]
    ServerError { status: u16, url: String },

    // Transport errors
    #[error("Request timed out")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Network error: {message}")]
    NetworkFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to decode response body: {message}")]
    Decode { message: String },

    // Terminal error after a retryable failure survived every attempt
    #[error("Request failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<GemdexError>,
    },
}

/// Result type alias for gemdex operations
pub type GemdexResult<T> = Result<T, GemdexError>;

impl GemdexError {
    /// Create an invalid-request error from any message
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::NetworkFailure {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Classify a non-success HTTP status code
    pub fn from_status(status: u16, url: &str) -> Self {
        match status {
            404 => Self::NotFound {
                url: url.to_string(),
            },
            401 => Self::Unauthorized {
                url: url.to_string(),
            },
            429 => Self::RateLimited {
                url: url.to_string(),
            },
            400..=499 => Self::InvalidRequest {
                message: format!("{url} rejected the request with status {status}"),
            },
            _ => Self::ServerError {
                status,
                url: url.to_string(),
            },
        }
    }

    /// HTTP status associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Unauthorized { .. } => Some(401),
            Self::RateLimited { .. } => Some(429),
            Self::ServerError { status, .. } => Some(*status),
            Self::RetriesExhausted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Check if this error indicates a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Check if this error indicates a rejected credential
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Check if retrying the request could plausibly succeed.
    ///
    /// Transient transport failures, rate limiting, and the transient
    /// server statuses (500, 502, 503, 504) qualify. Timeouts and
    /// cancellations do not: their deadline has already been spent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkFailure { .. } | Self::RateLimited { .. } => true,
            Self::ServerError { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        let url = "https://rubygems.org/api/v1/gems/rails.json";

        assert!(matches!(
            GemdexError::from_status(404, url),
            GemdexError::NotFound { .. }
        ));
        assert!(matches!(
            GemdexError::from_status(401, url),
            GemdexError::Unauthorized { .. }
        ));
        assert!(matches!(
            GemdexError::from_status(429, url),
            GemdexError::RateLimited { .. }
        ));
        assert!(matches!(
            GemdexError::from_status(422, url),
            GemdexError::InvalidRequest { .. }
        ));
        assert!(matches!(
            GemdexError::from_status(503, url),
            GemdexError::ServerError { status: 503, .. }
        ));
    }

    #[test]
    fn test_status_accessor() {
        let url = "https://rubygems.org/api/v1/downloads.json";
        assert_eq!(GemdexError::from_status(404, url).status(), Some(404));
        assert_eq!(GemdexError::from_status(500, url).status(), Some(500));
        assert_eq!(GemdexError::Timeout.status(), None);

        let exhausted = GemdexError::RetriesExhausted {
            attempts: 3,
            source: Box::new(GemdexError::from_status(503, url)),
        };
        assert_eq!(exhausted.status(), Some(503));
    }

    #[test]
    fn test_retryable_classification() {
        let url = "https://rubygems.org/api/v1/gems/rails.json";

        assert!(GemdexError::from_status(429, url).is_retryable());
        assert!(GemdexError::from_status(500, url).is_retryable());
        assert!(GemdexError::from_status(502, url).is_retryable());
        assert!(GemdexError::from_status(503, url).is_retryable());
        assert!(GemdexError::from_status(504, url).is_retryable());
        assert!(GemdexError::NetworkFailure {
            message: "connection reset".to_string(),
            source: None,
        }
        .is_retryable());

        assert!(!GemdexError::from_status(404, url).is_retryable());
        assert!(!GemdexError::from_status(401, url).is_retryable());
        assert!(!GemdexError::from_status(501, url).is_retryable());
        assert!(!GemdexError::Timeout.is_retryable());
        assert!(!GemdexError::Cancelled.is_retryable());
        assert!(!GemdexError::invalid_request("empty gem name").is_retryable());
        assert!(!GemdexError::Decode {
            message: "unexpected end of input".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = GemdexError::from_status(503, "https://rubygems.org/api/v1/downloads.json");
        assert_eq!(
            err.to_string(),
            "Server error 503 from https://rubygems.org/api/v1/downloads.json"
        );

        let exhausted = GemdexError::RetriesExhausted {
            attempts: 3,
            source: Box::new(err),
        };
        assert!(exhausted.to_string().starts_with("Request failed after 3 attempts"));
    }
}
