//! Reference host for the batching engine
//!
//! Wires configuration into a running engine and drives it:
//!
//! - [`pump`] - one task per partition, injecting maximum-wait signals
//! - [`source`] - JSON-lines replay of captured events
//!
//! [`Engine::from_config`] builds the checkpoint store, consumers, batching
//! service and lifecycle notifier in dependency order.

pub mod pump;
pub mod source;

pub use pump::{PartitionPump, PumpSummary};
pub use source::{ReplayRecord, ReplayReport, ReplaySource};

use crate::adapters::blob::{BlobStore, FileSystemBlobStore, InMemoryBlobStore};
use crate::adapters::consumers::{JsonlFileConsumer, LoggingConsumer};
use crate::config::{CheckpointConfig, CheckpointStoreKind, OutputConfig, OutputKind, VitalStreamConfig};
use crate::core::batching::EventBatchingService;
use crate::core::checkpoint::{CheckpointClient, StorageCheckpointClient};
use crate::core::consumer::{EventConsumer, EventConsumerService};
use crate::core::lifecycle::PartitionLifecycleNotifier;
use crate::domain::{Result, VitalStreamError};
use std::sync::Arc;
use std::time::Duration;

/// Fully wired engine components
pub struct Engine {
    pub checkpoints: Arc<StorageCheckpointClient>,
    pub batching: Arc<EventBatchingService>,
    pub lifecycle: Arc<PartitionLifecycleNotifier>,
    pub max_wait: Duration,
}

impl Engine {
    /// Build every component from validated configuration
    ///
    /// # Errors
    ///
    /// Returns a validation error if the source identity or batching options
    /// are invalid, or a configuration error for an unusable consumer.
    pub fn from_config(config: &VitalStreamConfig) -> Result<Self> {
        let checkpoints = Arc::new(checkpoint_client(config)?);

        let consumers = config
            .consumer
            .outputs
            .iter()
            .map(build_consumer)
            .collect::<Result<Vec<_>>>()?;
        let consumer_service = Arc::new(EventConsumerService::new(
            consumers,
            config.consumer.retry.to_policy(),
        ));

        let batching = Arc::new(EventBatchingService::new(
            config.batching.to_options()?,
            consumer_service,
            checkpoints.clone() as Arc<dyn CheckpointClient>,
        ));
        let lifecycle = Arc::new(PartitionLifecycleNotifier::new(
            batching.clone(),
            checkpoints.clone() as Arc<dyn CheckpointClient>,
        ));

        tracing::info!(
            source = %checkpoints.paths().identity(),
            flush_timespan_seconds = config.batching.flush_timespan_seconds,
            max_events = config.batching.max_events,
            consumers = config.consumer.outputs.len(),
            "Engine initialized"
        );

        Ok(Self {
            checkpoints,
            batching,
            lifecycle,
            max_wait: config.event_hub.max_wait(),
        })
    }

    pub fn replay_source(&self) -> ReplaySource {
        ReplaySource::new(self.batching.clone(), self.lifecycle.clone(), self.max_wait)
    }
}

/// Checkpoint client over the configured store
///
/// # Errors
///
/// Returns a validation error if the source identity cannot be derived.
pub fn checkpoint_client(config: &VitalStreamConfig) -> Result<StorageCheckpointClient> {
    let identity = config.event_hub.source_identity()?;
    Ok(StorageCheckpointClient::new(
        blob_store(&config.checkpoint),
        &config.checkpoint.blob_prefix,
        identity,
        config.checkpoint.batch_frequency,
    ))
}

fn blob_store(config: &CheckpointConfig) -> Arc<dyn BlobStore> {
    match config.store {
        CheckpointStoreKind::Filesystem => {
            Arc::new(FileSystemBlobStore::new(&config.storage_path))
        }
        CheckpointStoreKind::Memory => Arc::new(InMemoryBlobStore::new()),
    }
}

fn build_consumer(output: &OutputConfig) -> Result<Arc<dyn EventConsumer>> {
    match output.kind {
        OutputKind::Log => Ok(Arc::new(LoggingConsumer::new(&output.name))),
        OutputKind::Jsonl => {
            let path = output.path.as_deref().ok_or_else(|| {
                VitalStreamError::Configuration(format!(
                    "Consumer '{}' of type jsonl requires a path",
                    output.name
                ))
            })?;
            Ok(Arc::new(JsonlFileConsumer::new(&output.name, path)))
        }
    }
}
