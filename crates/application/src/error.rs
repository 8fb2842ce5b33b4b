//! Application error types

use backoffice_domain::DomainError;
use thiserror::Error;

use crate::ports::{CredentialStoreError, HttpClientError, IdentityError};

/// Why a session could not be recovered by refreshing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionExpiredReason {
    /// No refresh token was stored.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The identity provider refused the refresh token.
    #[error("refresh token rejected: {0}")]
    Rejected(String),

    /// The identity provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),

    /// The refresh call exceeded the configured limit.
    #[error("token refresh timed out")]
    TimedOut,
}

impl From<IdentityError> for SessionExpiredReason {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::Network(message) => Self::Unreachable(message),
            IdentityError::Rejected { message, .. } | IdentityError::InvalidResponse(message) => {
                Self::Rejected(message)
            }
        }
    }
}

/// Errors returned by [`AuthenticatedGateway::send`](crate::AuthenticatedGateway::send).
///
/// Cloneable: one refresh outcome is delivered to every queued caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The session could not be refreshed and has been torn down.
    #[error("session expired: {0}")]
    SessionExpired(SessionExpiredReason),

    /// The request was rejected again right after a successful refresh.
    #[error("unauthenticated: request rejected after token refresh")]
    Unauthorized,

    /// The transport failed; passed through untouched.
    #[error(transparent)]
    Transport(#[from] HttpClientError),

    /// Reading or writing the credential store failed.
    #[error("credential store error: {0}")]
    CredentialStore(String),

    /// The caller performing the refresh went away before it settled.
    #[error("token refresh abandoned before completion")]
    RefreshAbandoned,
}

impl GatewayError {
    /// Returns true if the session was torn down because of this error.
    ///
    /// Store failures leave the session in place: the stored credentials
    /// were not proven invalid, only unreadable or unwritable.
    #[must_use]
    pub const fn ends_session(&self) -> bool {
        matches!(self, Self::SessionExpired(_) | Self::Unauthorized)
    }
}

impl From<CredentialStoreError> for GatewayError {
    fn from(error: CredentialStoreError) -> Self {
        Self::CredentialStore(error.to_string())
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors from login, logout and profile lookups.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The identity provider refused or failed the login.
    #[error("login failed: {0}")]
    Identity(#[from] IdentityError),

    /// Reading or writing the credential store failed.
    #[error("credential store error: {0}")]
    CredentialStore(#[from] CredentialStoreError),

    /// The user profile could not be encoded.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}
