//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod credential_store;
mod http_client;
mod identity_provider;
mod navigator;

pub use credential_store::{CredentialStore, CredentialStoreError};
pub use http_client::{HttpClient, HttpClientError};
pub use identity_provider::{IdentityError, IdentityProvider};
pub use navigator::Navigator;
