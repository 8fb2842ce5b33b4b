//! Credential store port
//!
//! Durable key-value storage for the session: access token, refresh token
//! and the cached user profile.

use async_trait::async_trait;
use backoffice_domain::{CredentialKey, CredentialPair};

/// Errors that can occur while reading or writing credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Repository trait for session credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Reads a value, or `None` if nothing is stored under the key.
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError>;

    /// Stores a value, replacing any previous one.
    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialStoreError>;

    /// Removes a value. Removing a missing key is not an error.
    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError>;

    /// Removes every session key.
    async fn clear(&self) -> Result<(), CredentialStoreError> {
        for key in CredentialKey::ALL {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Stores both halves of a credential pair.
    async fn store_pair(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError> {
        self.set(CredentialKey::AccessToken, &pair.access_token)
            .await?;
        self.set(CredentialKey::RefreshToken, &pair.refresh_token)
            .await
    }
}
