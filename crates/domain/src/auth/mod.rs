//! Authentication domain types

mod credential;
mod token;
mod user;

pub use credential::{CredentialKey, CredentialPair, token_preview};
pub use token::{LoginGrant, TokenGrant};
pub use user::UserProfile;
