//! Integration tests for checkpoint persistence and source-change reset

use chrono::Utc;
use std::sync::Arc;
use tempfile::TempDir;
use test_case::test_case;
use vitalstream::adapters::blob::{BlobStore, FileSystemBlobStore, InMemoryBlobStore};
use vitalstream::core::checkpoint::{CheckpointClient, SourceIdentity, StorageCheckpointClient};
use vitalstream::domain::{EventMessage, PartitionId};

const NAMESPACE: &str = "telemetry.servicebus.windows.net";

fn event(partition: &str, seq: i64) -> EventMessage {
    EventMessage::builder()
        .partition_id(PartitionId::new(partition).unwrap())
        .sequence_number(seq)
        .offset((seq * 512).to_string())
        .enqueued_time(Utc::now())
        .build()
        .unwrap()
}

fn client(
    store: Arc<dyn BlobStore>,
    prefix: &str,
    namespace: &str,
    entity: &str,
) -> StorageCheckpointClient {
    StorageCheckpointClient::new(
        store,
        prefix,
        SourceIdentity::new(namespace, entity, "$Default").unwrap(),
        1,
    )
}

async fn seed(store: Arc<dyn BlobStore>) {
    let current = client(store.clone(), "iomt", NAMESPACE, "vitals");
    current.set_checkpoint(&event("0", 10)).await.unwrap();
    current.set_checkpoint(&event("1", 20)).await.unwrap();

    let other_app = client(store.clone(), "other-app", "old.servicebus.windows.net", "legacy");
    other_app.set_checkpoint(&event("0", 99)).await.unwrap();
}

#[tokio::test]
async fn test_reset_with_unchanged_source_deletes_nothing() {
    let store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
    seed(store.clone()).await;

    let restarted = client(store.clone(), "iomt", NAMESPACE, "vitals");
    assert_eq!(restarted.reset_checkpoints().await.unwrap(), 0);

    let resumed = restarted
        .get_checkpoint(&PartitionId::new("1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resumed.sequence_number, 20);
    assert_eq!(resumed.offset, "10240");
}

#[test_case("other.servicebus.windows.net", "vitals"; "namespace changed")]
#[test_case(NAMESPACE, "vitals-v2"; "entity changed")]
#[tokio::test]
async fn test_reset_after_source_change(namespace: &str, entity: &str) {
    let store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
    seed(store.clone()).await;

    let switched = client(store.clone(), "iomt", namespace, entity);
    assert_eq!(switched.reset_checkpoints().await.unwrap(), 2);
    assert!(switched.list_checkpoints().await.unwrap().is_empty());
    assert!(store.list("iomt/").await.unwrap().is_empty());

    // Another application's checkpoints are never touched.
    assert_eq!(store.list("other-app/").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reset_removes_legacy_layout_and_keeps_other_consumer_groups() {
    let store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
    store
        .upload("iomt/checkpoint/0", br#"{"legacy":true}"#.to_vec())
        .await
        .unwrap();

    let analytics = StorageCheckpointClient::new(
        store.clone(),
        "iomt",
        SourceIdentity::new(NAMESPACE, "vitals", "analytics").unwrap(),
        1,
    );
    analytics.set_checkpoint(&event("0", 5)).await.unwrap();

    let default_group = client(store.clone(), "iomt", NAMESPACE, "vitals");
    assert_eq!(default_group.reset_checkpoints().await.unwrap(), 1);

    let remaining = store.list("iomt/").await.unwrap();
    assert_eq!(
        remaining,
        vec![format!("iomt/checkpoint/{NAMESPACE}/vitals/analytics/0")]
    );
}

#[tokio::test]
async fn test_filesystem_store_round_trip_and_reset() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn BlobStore> = Arc::new(FileSystemBlobStore::new(dir.path()));
    seed(store.clone()).await;

    assert!(dir
        .path()
        .join("iomt/checkpoint")
        .join(NAMESPACE)
        .join("vitals/$default/0")
        .exists());

    let current = client(store.clone(), "iomt", NAMESPACE, "vitals");
    let listed = current.list_checkpoints().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].partition_id.as_str(), "0");
    assert_eq!(listed[1].sequence_number, 20);

    let switched = client(store, "iomt", NAMESPACE, "devices");
    assert_eq!(switched.reset_checkpoints().await.unwrap(), 2);
    assert!(dir.path().join("other-app").exists());
}

#[tokio::test]
async fn test_batch_frequency_skips_writes() {
    let store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
    let client = StorageCheckpointClient::new(
        store,
        "iomt",
        SourceIdentity::new(NAMESPACE, "vitals", "").unwrap(),
        3,
    );
    let pid = PartitionId::new("7").unwrap();

    client.set_checkpoint(&event("7", 1)).await.unwrap();
    client.set_checkpoint(&event("7", 2)).await.unwrap();
    assert!(client.get_checkpoint(&pid).await.unwrap().is_none());

    client.set_checkpoint(&event("7", 3)).await.unwrap();
    let stored = client.get_checkpoint(&pid).await.unwrap().unwrap();
    assert_eq!(stored.sequence_number, 3);
    assert_eq!(stored.epoch, 1);
    assert_eq!(stored.owner, client.owner());
}
