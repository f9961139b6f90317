//! In-memory content store addressed by the SHA-256 of each blob.

use crate::errors::ContentStoreError;
use crate::ports::ContentStore;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

/// Lowercase hex SHA-256 of `content`.
#[must_use]
pub fn content_address(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Stand-in for an external content-addressed store.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    latency: Option<Duration>,
    offline: RwLock<bool>,
}

impl InMemoryContentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every `get` by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every `get` fail with `Unavailable` until turned back on.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut flag) = self.offline.write() {
            *flag = offline;
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_offline(&self) -> bool {
        self.offline.read().map(|f| *f).unwrap_or(true)
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, content: Vec<u8>) -> Result<String, ContentStoreError> {
        if content.is_empty() {
            return Err(ContentStoreError::EmptyContent);
        }
        let hash = content_address(&content);
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| ContentStoreError::Unavailable("lock poisoned".into()))?;
        blobs.entry(hash.clone()).or_insert(content);
        debug!(hash = %hash, "Content stored");
        Ok(hash)
    }

    async fn get(&self, hash: &str) -> Result<Vec<u8>, ContentStoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.is_offline() {
            return Err(ContentStoreError::Unavailable("store offline".into()));
        }
        let blobs = self
            .blobs
            .read()
            .map_err(|_| ContentStoreError::Unavailable("lock poisoned".into()))?;
        blobs
            .get(hash)
            .cloned()
            .ok_or_else(|| ContentStoreError::NotFound {
                hash: hash.to_string(),
            })
    }
}
