//! Session management: login, logout and the cached user profile.

use std::sync::Arc;

use backoffice_domain::{CredentialKey, LoginGrant, UserProfile};
use tracing::{info, warn};

use crate::error::SessionError;
use crate::ports::{CredentialStore, IdentityProvider};

/// Starts and ends sessions against the identity provider.
///
/// Shares the credential store with the gateway, so a successful login is
/// picked up by the next request.
#[derive(Clone)]
pub struct SessionService {
    identity: Arc<dyn IdentityProvider>,
    credentials: Arc<dyn CredentialStore>,
}

impl SessionService {
    /// Creates a session service over the given collaborators.
    pub fn new(identity: Arc<dyn IdentityProvider>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            identity,
            credentials,
        }
    }

    /// Logs in and persists the tokens and user profile.
    ///
    /// Nothing is left behind in the store if the login fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity provider rejects the credentials or
    /// the session cannot be persisted.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, SessionError> {
        let login = self.identity.login(username, password).await?;

        if let Err(e) = self.persist(&login).await {
            if let Err(clear_err) = self.credentials.clear().await {
                warn!(error = %clear_err, "failed to roll back partially stored session");
            }
            return Err(e);
        }

        info!(user_id = %login.user.id, role = %login.user.role, "logged in");
        Ok(login.user)
    }

    async fn persist(&self, login: &LoginGrant) -> Result<(), SessionError> {
        let user = login.user.to_stored()?;
        self.credentials.store_pair(&login.grant.credentials).await?;
        self.credentials.set(CredentialKey::User, &user).await?;
        Ok(())
    }

    /// Ends the session by clearing every stored credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.credentials.clear().await?;
        info!("logged out");
        Ok(())
    }

    /// Returns the cached user profile.
    ///
    /// A cached value that no longer decodes is removed and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn current_user(&self) -> Result<Option<UserProfile>, SessionError> {
        let Some(raw) = self.credentials.get(CredentialKey::User).await? else {
            return Ok(None);
        };

        match UserProfile::from_stored(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "discarding unreadable cached user profile");
                self.credentials.remove(CredentialKey::User).await?;
                Ok(None)
            }
        }
    }

    /// Returns true if an access token is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn is_authenticated(&self) -> Result<bool, SessionError> {
        Ok(self
            .credentials
            .get(CredentialKey::AccessToken)
            .await?
            .is_some())
    }
}
