//! # Node Ports
//!
//! The off-ledger content store. Waveform data lives here; the ledger keeps
//! only the hash returned by `put`.

use crate::errors::ContentStoreError;
use async_trait::async_trait;
use std::sync::Arc;

/// Content-addressed blob storage.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `content` and return its address.
    async fn put(&self, content: Vec<u8>) -> Result<String, ContentStoreError>;

    /// Fetch the content stored under `hash`.
    async fn get(&self, hash: &str) -> Result<Vec<u8>, ContentStoreError>;
}

#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    async fn put(&self, content: Vec<u8>) -> Result<String, ContentStoreError> {
        (**self).put(content).await
    }

    async fn get(&self, hash: &str) -> Result<Vec<u8>, ContentStoreError> {
        (**self).get(hash).await
    }
}
