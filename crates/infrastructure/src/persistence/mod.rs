//! Credential store implementations.

mod file_store;
mod memory_store;

pub use file_store::FileCredentialStore;
pub use memory_store::InMemoryCredentialStore;
