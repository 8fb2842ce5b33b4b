//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A header name is invalid.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// The request body could not be built.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A cached user profile could not be decoded.
    #[error("invalid user profile: {0}")]
    InvalidUserProfile(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
