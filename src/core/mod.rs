//! Core business logic for VitalStream.
//!
//! # Modules
//!
//! - [`batching`] - per-partition windows, flush policy and the batching engine
//! - [`consumer`] - downstream consumer capability with bounded retry
//! - [`checkpoint`] - checkpoint records, source identity and persistence
//! - [`lifecycle`] - partition ownership notifications and error classification
//!
//! # Event flow
//!
//! 1. **Startup**: the lifecycle notifier purges checkpoints of a previous source
//! 2. **Acquire**: stale partition state is discarded, the resume position is read
//! 3. **Consume**: each event or maximum-wait signal is routed to its partition window
//! 4. **Flush**: expired or full windows are delivered to every consumer with retry
//! 5. **Checkpoint**: the last delivered event is recorded
//! 6. **Lose**: revoked partitions are dropped without flushing
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitalstream::adapters::blob::InMemoryBlobStore;
//! use vitalstream::adapters::consumers::LoggingConsumer;
//! use vitalstream::core::batching::{BatchingOptions, EventBatchingService};
//! use vitalstream::core::checkpoint::{SourceIdentity, StorageCheckpointClient};
//! use vitalstream::core::consumer::{EventConsumerService, RetryPolicy};
//! use vitalstream::domain::{EventMessage, PartitionId};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let identity = SourceIdentity::new("ns.servicebus.windows.net", "vitals", "$default")?;
//! let checkpoints = Arc::new(StorageCheckpointClient::new(
//!     Arc::new(InMemoryBlobStore::new()),
//!     "iomt",
//!     identity,
//!     1,
//! ));
//! let consumers = Arc::new(EventConsumerService::new(
//!     vec![Arc::new(LoggingConsumer::new("log"))],
//!     RetryPolicy::default(),
//! ));
//! let engine = EventBatchingService::new(BatchingOptions::new(300, 500)?, consumers, checkpoints);
//!
//! let event = EventMessage::builder()
//!     .partition_id(PartitionId::new("0")?)
//!     .sequence_number(1)
//!     .enqueued_time(chrono::Utc::now())
//!     .build()?;
//! engine.consume_event(event.into(), &CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod batching;
pub mod checkpoint;
pub mod consumer;
pub mod lifecycle;
