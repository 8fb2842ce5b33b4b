//! Identity provider port

use async_trait::async_trait;
use backoffice_domain::{LoginGrant, TokenGrant};
use thiserror::Error;

/// Errors reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The provider answered and said no.
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status of the rejection
        status: u16,
        /// Error description from the provider
        message: String,
    },

    /// The provider could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with something that is not a token response.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Remote service issuing and refreshing tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges a refresh token for a new credential pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the provider is unreachable.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, IdentityError>;

    /// Exchanges a username and password for an initial session.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the provider is unreachable.
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, IdentityError>;
}
