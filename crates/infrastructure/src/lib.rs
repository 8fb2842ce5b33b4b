//! Back Office Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus settings loading.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{ChannelNavigator, LoggingNavigator, NavigationEvent, ReqwestHttpClient};
pub use auth::{HttpIdentityProvider, IdentityEndpoints};
pub use config::{ConfigError, DEFAULT_SETTINGS_FILE, IdentitySettings, Settings};
pub use persistence::{FileCredentialStore, InMemoryCredentialStore};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
