//! Error types for weft.

use thiserror::Error;

/// Result type alias using weft's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for weft operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Graph validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl Error {
    /// Whether the error is a transport failure worth retrying.
    ///
    /// Only timeouts and connection errors qualify; a malformed response or
    /// a non-2xx status is not going to improve on a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Request(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_inference() {
        let err = Error::Inference("model returned 500".to_string());
        assert_eq!(err.to_string(), "Inference error: model returned 500");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("bad uuid".to_string());
        assert_eq!(err.to_string(), "Invalid input: bad uuid");
    }

    #[test]
    fn test_serde_json_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_request_is_retryable() {
        assert!(Error::Request("timeout".into()).is_retryable());
        assert!(!Error::Inference("bad status".into()).is_retryable());
        assert!(!Error::Config("missing url".into()).is_retryable());
    }
}
