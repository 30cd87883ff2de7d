//! Checkpoint client
//!
//! Persists the last flushed position per partition and purges checkpoints
//! written for a different source when the configured namespace or event hub
//! changes.

use super::identity::SourceIdentity;
use super::record::{Checkpoint, CheckpointPaths};
use crate::adapters::blob::BlobStore;
use crate::domain::{CheckpointError, EventMessage, PartitionId, Result, VitalStreamError};
use crate::log_checkpoint;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Durable store of per-partition positions
#[async_trait]
pub trait CheckpointClient: Send + Sync {
    /// Record `event` as the last safely processed event of its partition
    ///
    /// Safe to call repeatedly; later calls overwrite earlier ones.
    async fn set_checkpoint(&self, event: &EventMessage) -> Result<()>;

    /// Stored position for `partition_id`, if any
    async fn get_checkpoint(&self, partition_id: &PartitionId) -> Result<Option<Checkpoint>>;

    /// Every stored position for the configured source and consumer group
    async fn list_checkpoints(&self) -> Result<Vec<Checkpoint>>;

    /// Delete checkpoints that do not belong to the configured source
    ///
    /// Returns the number of deleted records.
    async fn reset_checkpoints(&self) -> Result<usize>;
}

#[derive(Debug, Default)]
struct PartitionProgress {
    skipped: u32,
    epoch: u64,
}

/// [`CheckpointClient`] backed by a [`BlobStore`]
pub struct StorageCheckpointClient {
    store: Arc<dyn BlobStore>,
    paths: CheckpointPaths,
    batch_frequency: u32,
    owner: String,
    progress: DashMap<PartitionId, PartitionProgress>,
}

impl StorageCheckpointClient {
    /// Create a client writing under `blob_prefix` for `identity`
    ///
    /// `batch_frequency` is the number of `set_checkpoint` calls per partition
    /// that result in one durable write; values below 1 are treated as 1.
    pub fn new(
        store: Arc<dyn BlobStore>,
        blob_prefix: &str,
        identity: SourceIdentity,
        batch_frequency: u32,
    ) -> Self {
        let owner = Uuid::new_v4().to_string();
        tracing::debug!(
            owner = %owner,
            source = %identity,
            backend = store.backend_name(),
            "Checkpoint client created"
        );

        Self {
            store,
            paths: CheckpointPaths::new(blob_prefix, identity),
            batch_frequency: batch_frequency.max(1),
            owner,
            progress: DashMap::new(),
        }
    }

    /// Id written into the `Owner` field of every record
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn paths(&self) -> &CheckpointPaths {
        &self.paths
    }

    async fn read_record(&self, blob: &str) -> Result<Option<Checkpoint>> {
        let data = self
            .store
            .download(blob)
            .await
            .map_err(|e| CheckpointError::ReadFailed(format!("{blob}: {e}")))?;

        data.map(|bytes| {
            Checkpoint::from_bytes(&bytes).map_err(|e| {
                VitalStreamError::from(CheckpointError::InvalidRecord {
                    blob: blob.to_string(),
                    message: e.to_string(),
                })
            })
        })
        .transpose()
    }
}

#[async_trait]
impl CheckpointClient for StorageCheckpointClient {
    async fn set_checkpoint(&self, event: &EventMessage) -> Result<()> {
        let partition_id = &event.partition_id;

        // The guard must be released before awaiting the store.
        let epoch = {
            let mut progress = self.progress.entry(partition_id.clone()).or_default();
            progress.skipped += 1;
            if progress.skipped < self.batch_frequency {
                tracing::trace!(
                    partition_id = %partition_id,
                    skipped = progress.skipped,
                    batch_frequency = self.batch_frequency,
                    "Checkpoint deferred"
                );
                return Ok(());
            }
            progress.epoch + 1
        };

        let record = Checkpoint {
            partition_id: partition_id.clone(),
            owner: self.owner.clone(),
            token: Uuid::new_v4().to_string(),
            epoch,
            offset: event.offset.clone(),
            sequence_number: event.sequence_number,
        };
        let blob = self.paths.blob_name(partition_id);
        let data = record.to_bytes()?;

        self.store
            .upload(&blob, data)
            .await
            .map_err(|e| CheckpointError::WriteFailed {
                partition_id: partition_id.to_string(),
                message: e.to_string(),
            })?;

        if let Some(mut progress) = self.progress.get_mut(partition_id) {
            progress.skipped = 0;
            progress.epoch = epoch;
        }

        log_checkpoint!(partition_id, record.sequence_number, record.offset, epoch);
        Ok(())
    }

    async fn get_checkpoint(&self, partition_id: &PartitionId) -> Result<Option<Checkpoint>> {
        self.read_record(&self.paths.blob_name(partition_id)).await
    }

    async fn list_checkpoints(&self) -> Result<Vec<Checkpoint>> {
        let names = self
            .store
            .list(&self.paths.consumer_group_prefix())
            .await
            .map_err(|e| CheckpointError::ReadFailed(e.to_string()))?;

        let mut checkpoints = Vec::with_capacity(names.len());
        for name in names {
            if let Some(checkpoint) = self.read_record(&name).await? {
                checkpoints.push(checkpoint);
            }
        }
        checkpoints.sort_by(|a, b| a.partition_id.cmp(&b.partition_id));
        Ok(checkpoints)
    }

    async fn reset_checkpoints(&self) -> Result<usize> {
        let root = self.paths.checkpoint_root();
        let keep = self.paths.source_prefix();

        let names = self
            .store
            .list(&root)
            .await
            .map_err(|e| CheckpointError::ReadFailed(e.to_string()))?;

        let mut deleted = 0;
        for name in names.into_iter().filter(|name| !name.starts_with(&keep)) {
            let removed = self
                .store
                .delete(&name)
                .await
                .map_err(|e| CheckpointError::DeleteFailed {
                    blob: name.clone(),
                    message: e.to_string(),
                })?;
            if removed {
                tracing::info!(blob = %name, "Deleted checkpoint for previous source");
                deleted += 1;
            }
        }

        tracing::info!(
            source = %self.paths.identity(),
            root = %root,
            deleted,
            "Checkpoint reset complete"
        );
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::blob::InMemoryBlobStore;
    use chrono::Utc;

    fn identity() -> SourceIdentity {
        SourceIdentity::new("ns.servicebus.windows.net", "vitals", "$default").unwrap()
    }

    fn event(partition: &str, seq: i64) -> EventMessage {
        EventMessage::builder()
            .partition_id(PartitionId::new(partition).unwrap())
            .sequence_number(seq)
            .offset(format!("{}", seq * 100))
            .enqueued_time(Utc::now())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_checkpoint() {
        let store = Arc::new(InMemoryBlobStore::new());
        let client = StorageCheckpointClient::new(store.clone(), "iomt", identity(), 1);

        client.set_checkpoint(&event("0", 5)).await.unwrap();
        client.set_checkpoint(&event("0", 9)).await.unwrap();

        let checkpoint = client
            .get_checkpoint(&PartitionId::new("0").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(checkpoint.sequence_number, 9);
        assert_eq!(checkpoint.offset, "900");
        assert_eq!(checkpoint.epoch, 2);
        assert_eq!(checkpoint.owner, client.owner());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_batch_frequency_skips_writes() {
        let store = Arc::new(InMemoryBlobStore::new());
        let client = StorageCheckpointClient::new(store.clone(), "iomt", identity(), 3);
        let partition = PartitionId::new("1").unwrap();

        client.set_checkpoint(&event("1", 1)).await.unwrap();
        client.set_checkpoint(&event("1", 2)).await.unwrap();
        assert!(client.get_checkpoint(&partition).await.unwrap().is_none());

        client.set_checkpoint(&event("1", 3)).await.unwrap();
        let checkpoint = client.get_checkpoint(&partition).await.unwrap().unwrap();
        assert_eq!(checkpoint.sequence_number, 3);

        client.set_checkpoint(&event("1", 4)).await.unwrap();
        let checkpoint = client.get_checkpoint(&partition).await.unwrap().unwrap();
        assert_eq!(checkpoint.sequence_number, 3);
    }

    #[tokio::test]
    async fn test_tokens_are_unique_per_write() {
        let store = Arc::new(InMemoryBlobStore::new());
        let client = StorageCheckpointClient::new(store, "iomt", identity(), 1);
        let partition = PartitionId::new("0").unwrap();

        client.set_checkpoint(&event("0", 1)).await.unwrap();
        let first = client.get_checkpoint(&partition).await.unwrap().unwrap();
        client.set_checkpoint(&event("0", 2)).await.unwrap();
        let second = client.get_checkpoint(&partition).await.unwrap().unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(first.owner, second.owner);
    }

    #[tokio::test]
    async fn test_invalid_record_is_reported() {
        let store = Arc::new(InMemoryBlobStore::new());
        let client = StorageCheckpointClient::new(store.clone(), "iomt", identity(), 1);
        let partition = PartitionId::new("0").unwrap();
        store
            .upload(&client.paths().blob_name(&partition), b"not json".to_vec())
            .await
            .unwrap();

        let err = client.get_checkpoint(&partition).await.unwrap_err();
        assert!(matches!(
            err,
            VitalStreamError::Checkpoint(CheckpointError::InvalidRecord { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_checkpoints_sorted() {
        let store = Arc::new(InMemoryBlobStore::new());
        let client = StorageCheckpointClient::new(store, "iomt", identity(), 1);
        client.set_checkpoint(&event("2", 20)).await.unwrap();
        client.set_checkpoint(&event("0", 1)).await.unwrap();

        let checkpoints = client.list_checkpoints().await.unwrap();
        let partitions: Vec<&str> = checkpoints.iter().map(|c| c.partition_id.as_str()).collect();
        assert_eq!(partitions, vec!["0", "2"]);
    }
}
