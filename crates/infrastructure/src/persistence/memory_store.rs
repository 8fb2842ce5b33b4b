//! In-memory credential store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_application::ports::{CredentialStore, CredentialStoreError};
use backoffice_domain::CredentialKey;
use tokio::sync::RwLock;

/// Thread-safe in-memory credential store.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    values: Arc<RwLock<HashMap<CredentialKey, String>>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored values.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialStoreError> {
        self.values.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError> {
        self.values.write().await.remove(&key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        self.values.write().await.clear();
        Ok(())
    }
}
