//! File-backed credential store.
//!
//! The whole session lives in one JSON object keyed by credential name:
//! ```json
//! {
//!   "access_token": "eyJhbGciOi...",
//!   "refresh_token": "rt-7f3c...",
//!   "user": "{\"id\":\"u-1\",...}"
//! }
//! ```
//! A missing file is an empty session. Writes go to a sibling temp file
//! that is renamed over the original, so a crash leaves either the old or
//! the new content.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use backoffice_application::ports::{CredentialStore, CredentialStoreError};
use backoffice_domain::CredentialKey;
use tokio::sync::Mutex;
use tracing::warn;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

type Entries = BTreeMap<String, String>;

/// Credential store persisted to a single JSON file.
///
/// Every write rewrites the file. Writes from one instance are serialized;
/// sharing the file between processes is not coordinated.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Creates a store backed by `path`. Nothing is read until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries, CredentialStoreError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };

        from_json_bytes(&content).map_err(|e| CredentialStoreError::Serialization(e.to_string()))
    }

    async fn save(&self, entries: &Entries) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable_bytes(entries)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;

        let staging = self.staging_path();
        tokio::fs::write(&staging, content).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("credentials"), OsString::from);
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Loads, applies `apply` and saves if it reports a change.
    ///
    /// An unreadable file holds no usable session, so writers start over
    /// from an empty one instead of failing forever.
    async fn update(
        &self,
        apply: impl FnOnce(&mut Entries) -> bool + Send,
    ) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock().await;
        let (mut entries, mut changed) = match self.load().await {
            Ok(entries) => (entries, false),
            Err(CredentialStoreError::Serialization(message)) => {
                warn!(path = %self.path.display(), error = %message, "discarding unreadable credentials file");
                (Entries::new(), true)
            }
            Err(e) => return Err(e),
        };
        changed |= apply(&mut entries);
        if changed {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        Ok(entries.remove(key.as_str()))
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialStoreError> {
        let value = value.to_string();
        self.update(move |entries| {
            entries.insert(key.as_str().to_string(), value);
            true
        })
        .await
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError> {
        self.update(|entries| entries.remove(key.as_str()).is_some())
            .await
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::metadata(&self.path).await {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            _ => self.save(&Entries::new()).await,
        }
    }
}
