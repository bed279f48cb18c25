//! Document Source Error Types
//!
//! Failures talking to the remote document API. These are treated as
//! transient: the affected revision or document is skipped and logged.

use thiserror::Error;

use crate::stats::ParseError;

/// Result type for document source calls
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while fetching from the document API
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    /// The request could not be sent or the connection failed
    #[error("Request to {uri} failed: {message}")]
    Request { uri: String, message: String },

    /// The API answered with a non-success status
    #[error("Request to {uri} returned status {status}")]
    Status { uri: String, status: u16 },

    /// The response body was not what the API promised
    #[error("Could not decode response from {uri}: {message}")]
    Decode { uri: String, message: String },

    /// The requested file or revision does not exist at the source
    #[error("Not found at source: {0}")]
    Missing(String),

    /// The response decoded but a field in it is malformed
    #[error("Malformed record: {0}")]
    Parse(#[from] ParseError),
}

impl FetchError {
    pub fn request(uri: impl Into<String>, message: impl ToString) -> Self {
        Self::Request {
            uri: uri.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(uri: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            uri: uri.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            uri: "https://example.test/export".to_string(),
            status: 403,
        };
        assert_eq!(err.to_string(), "Request to https://example.test/export returned status 403");

        let err = FetchError::request("https://example.test", "connection reset");
        assert!(err.to_string().contains("connection reset"));

        let err = FetchError::from(ParseError::timestamp("yesterday", "input contains invalid characters"));
        assert!(err.to_string().starts_with("Malformed record: Invalid timestamp 'yesterday'"));
    }
}
