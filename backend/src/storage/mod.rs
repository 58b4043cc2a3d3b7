//! Artifact storage backends.

pub mod filesystem;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Storage key for a box file: `owner/box/version/provider.box`.
pub fn artifact_key(owner: &str, box_name: &str, version: &str, provider: &str) -> String {
    format!("{}/{}/{}/{}.box", owner, box_name, version, provider)
}

/// Storage backend trait
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store content with the given key
    async fn put(&self, key: &str, content: Bytes) -> Result<()>;

    /// Retrieve content by key
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Check that the backend can serve requests
    async fn health_check(&self) -> Result<()>;
}
