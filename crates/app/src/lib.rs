//! Back-office client wiring.
//!
//! Turns [`Settings`] into a ready gateway and session service, and defines
//! the command line the `backoffice` binary accepts.

mod cli;

use std::sync::Arc;

use backoffice_application::ports::{CredentialStore, Navigator};
use backoffice_application::{AuthenticatedGateway, HttpClientError, SessionService};
use backoffice_domain::DomainError;
use backoffice_infrastructure::{
    ConfigError, FileCredentialStore, HttpIdentityProvider, InMemoryCredentialStore,
    ReqwestHttpClient, Settings,
};
use tracing::debug;

pub use cli::{Action, Cli, Command};

/// Errors raised while wiring the client or reading the command line.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Settings could not be loaded or interpreted.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP transport could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Transport(#[from] HttpClientError),

    /// Request arguments were invalid.
    #[error(transparent)]
    Request(#[from] DomainError),
}

/// A wired client: gateway and session service over one credential store.
pub struct BackOffice {
    gateway: AuthenticatedGateway,
    session: SessionService,
}

impl BackOffice {
    /// Builds every adapter from `settings`.
    ///
    /// Credentials go to `settings.credentials_file` when set and stay in
    /// memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL setting is invalid or the HTTP client
    /// cannot be built.
    pub fn from_settings(
        settings: &Settings,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, AppError> {
        let credentials: Arc<dyn CredentialStore> = match &settings.credentials_file {
            Some(path) => {
                debug!(path = %path.display(), "using file credential store");
                Arc::new(FileCredentialStore::new(path.clone()))
            }
            None => {
                debug!("using in-memory credential store");
                Arc::new(InMemoryCredentialStore::new())
            }
        };

        let http = Arc::new(ReqwestHttpClient::new(
            settings.api_base_url()?,
            settings.request_timeout(),
        )?);
        let identity = Arc::new(HttpIdentityProvider::new(settings.identity_endpoints()?));

        let gateway = AuthenticatedGateway::new(
            http,
            Arc::clone(&credentials),
            identity.clone(),
            navigator,
        )
        .with_config(settings.gateway_config());
        let session = SessionService::new(identity, credentials);

        Ok(Self { gateway, session })
    }

    /// Authenticated request gateway.
    #[must_use]
    pub const fn gateway(&self) -> &AuthenticatedGateway {
        &self.gateway
    }

    /// Login, logout and cached user.
    #[must_use]
    pub const fn session(&self) -> &SessionService {
        &self.session
    }
}
