//! HTTP Client port

use async_trait::async_trait;
use backoffice_domain::{ApiRequest, ApiResponse};
use thiserror::Error;

/// Transport-level failures. None of them say anything about the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpClientError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Limit that was exceeded
        timeout_ms: u64,
    },

    /// Host name resolution failed.
    #[error("could not resolve host {host}: {message}")]
    DnsError {
        /// Host that failed to resolve
        host: String,
        /// Underlying error
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host
        host: String,
        /// Target port
        port: u16,
    },

    /// Any other connection failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The target could not be turned into a URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Anything else reported by the HTTP library.
    #[error("HTTP error: {0}")]
    Other(String),
}

/// Port for dispatching HTTP requests.
///
/// This trait abstracts the HTTP client implementation, allowing
/// the application layer to be independent of specific HTTP libraries.
/// Non-2xx statuses are responses, not errors.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes a request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError>;
}
