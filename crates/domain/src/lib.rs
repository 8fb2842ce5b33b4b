//! Back Office Domain - Core business types
//!
//! This crate defines the domain model for the back-office API client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod request;
pub mod response;

pub use auth::{CredentialKey, CredentialPair, LoginGrant, TokenGrant, UserProfile, token_preview};
pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, Header, Headers, HttpMethod, RequestBody};
pub use response::{ApiResponse, StatusCode};
