//! Tokens issued by the identity provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CredentialPair, UserProfile};

/// Token pair with metadata for expiry tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// The issued credentials
    pub credentials: CredentialPair,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// When the access token expires (if known)
    pub expires_at: Option<DateTime<Utc>>,
    /// When this grant was obtained
    pub obtained_at: DateTime<Utc>,
}

impl TokenGrant {
    /// Creates a grant stamped with the current time.
    #[must_use]
    pub fn new(
        credentials: CredentialPair,
        token_type: impl Into<String>,
        expires_in_secs: Option<u64>,
    ) -> Self {
        let now = Utc::now();
        let expires_at = expires_in_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| now + chrono::Duration::seconds(secs));

        Self {
            credentials,
            token_type: token_type.into(),
            expires_at,
            obtained_at: now,
        }
    }

    /// Check if the access token is expired or will expire within the given buffer.
    #[must_use]
    pub fn is_expired_or_expiring(&self, buffer_seconds: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            Utc::now() + chrono::Duration::seconds(buffer_seconds) >= expires_at
        })
    }

    /// Time until expiry in seconds, or None if no expiry.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|exp| (exp - Utc::now()).num_seconds())
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.credentials.access_token
    }
}

/// Result of a successful login: a token grant plus the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginGrant {
    /// Issued tokens
    pub grant: TokenGrant,
    /// Profile of the user the tokens belong to
    pub user: UserProfile,
}
