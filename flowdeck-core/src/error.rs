//! Structured error types for flowdeck-core.
//!
//! Every remote-call failure ends up here. The UI never shows these variants
//! directly: it shows [`USER_FACING_MESSAGE`] and logs the detail.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The single message shown to the user for any failed load.
pub const USER_FACING_MESSAGE: &str =
    "Failed to load workflows. Check that the API server is running and press 'r' to retry.";

/// Main error type for flowdeck-core operations
#[derive(Error, Debug)]
pub enum DeckError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    /// Request never produced a response (connect, TLS, body read)
    #[error("Network error calling {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body was not the JSON we expected
    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// Filter value rejected before a request was built
    #[error("Invalid filter '{field}': {reason}")]
    InvalidFilter { field: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// I/O operation failed
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Every clipboard path failed
    #[error("Clipboard unavailable: {reason}")]
    Clipboard { reason: String },
}

/// Result type alias for flowdeck-core operations
pub type Result<T> = std::result::Result<T, DeckError>;

impl DeckError {
    pub fn http(status: u16, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_filter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn clipboard(reason: impl Into<String>) -> Self {
        Self::Clipboard {
            reason: reason.into(),
        }
    }

    /// Whether this failure came from talking to the API
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Network { .. } | Self::Decode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeckError::http(503, "http://localhost/api/stats", "unavailable");
        assert_eq!(
            err.to_string(),
            "HTTP 503 from http://localhost/api/stats: unavailable"
        );

        let err = DeckError::invalid_filter("per_page", "must be between 1 and 100");
        assert!(err.to_string().contains("per_page"));
    }

    #[test]
    fn test_remote_classification() {
        assert!(DeckError::decode("u", "bad json").is_remote());
        assert!(!DeckError::config("missing base_url").is_remote());
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(!DeckError::io("/tmp/x", io_err).is_remote());
    }
}
