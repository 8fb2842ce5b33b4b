//! Back Office Application - Ports and the authenticated gateway
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for transport, credential storage, identity and navigation)
//! - The token-refresh coordinator and the authenticated request gateway
//! - Session management (login, logout, cached user)
//! - Application-level error handling

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{RefreshCoordinator, RefreshState, SessionService};
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult, SessionError, SessionExpiredReason};
pub use gateway::AuthenticatedGateway;
pub use ports::{
    CredentialStore, CredentialStoreError, HttpClient, HttpClientError, IdentityError,
    IdentityProvider, Navigator,
};
