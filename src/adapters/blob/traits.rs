//! Blob storage abstraction
//!
//! Checkpoints are persisted as small named blobs. Names use `/` as a
//! hierarchy separator so a prefix listing selects a subtree.

use crate::domain::Result;
use async_trait::async_trait;

/// Key/value blob store used by the checkpoint client
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `name`, overwriting any existing blob
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    async fn upload(&self, name: &str, data: Vec<u8>) -> Result<()>;

    /// Read the blob stored under `name`
    ///
    /// Returns `Ok(None)` when the blob does not exist.
    async fn download(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Names of every blob starting with `prefix`, sorted
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Delete the blob stored under `name`
    ///
    /// Returns `Ok(false)` when there was nothing to delete.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
