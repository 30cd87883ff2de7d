//! Partition lifecycle coordination
//!
//! [`PartitionLifecycleNotifier`] sits between the broker-integration layer
//! and the batching engine. It translates ownership callbacks into engine
//! notifications, runs the one-time checkpoint reset at startup, and
//! classifies processing errors as expected rebalancing noise or genuine
//! failures.

use crate::core::batching::EventBatchingService;
use crate::core::checkpoint::{Checkpoint, CheckpointClient};
use crate::domain::{BrokerError, PartitionId, Result, VitalStreamError};
use crate::log_error_with_context;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Why processing of a partition stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStoppedReason {
    /// Ownership moved to another processor
    OwnershipLost,
    /// The local processor is shutting down
    Shutdown,
}

impl fmt::Display for ProcessingStoppedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStoppedReason::OwnershipLost => f.write_str("ownership_lost"),
            ProcessingStoppedReason::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// How the host should treat a processing error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Normal rebalancing; keep running
    Expected,
    /// A real failure; surface it
    Failure,
}

/// Adapter from broker ownership callbacks to the batching engine
pub struct PartitionLifecycleNotifier {
    batching: Arc<EventBatchingService>,
    checkpoints: Arc<dyn CheckpointClient>,
    reset: OnceCell<usize>,
}

impl PartitionLifecycleNotifier {
    pub fn new(batching: Arc<EventBatchingService>, checkpoints: Arc<dyn CheckpointClient>) -> Self {
        Self {
            batching,
            checkpoints,
            reset: OnceCell::new(),
        }
    }

    /// Purge checkpoints of a previous source; runs at most once
    ///
    /// Must complete before any event is consumed. Later calls return the
    /// count from the first successful run. A failed run is retried on the
    /// next call.
    pub async fn initialize(&self) -> Result<usize> {
        let deleted = self
            .reset
            .get_or_try_init(|| async {
                tracing::info!("Resetting checkpoints for changed source identity");
                self.checkpoints.reset_checkpoints().await
            })
            .await?;
        Ok(*deleted)
    }

    /// A partition was assigned to this processor
    ///
    /// Clears stale engine state and returns the stored resume position.
    pub async fn partition_initializing(
        &self,
        partition_id: &PartitionId,
    ) -> Result<Option<Checkpoint>> {
        self.batching.notify_partition_acquired(partition_id);

        let checkpoint = self.checkpoints.get_checkpoint(partition_id).await?;
        match &checkpoint {
            Some(c) => tracing::info!(
                partition_id = %partition_id,
                sequence_number = c.sequence_number,
                offset = %c.offset,
                "Resuming partition from checkpoint"
            ),
            None => tracing::info!(
                partition_id = %partition_id,
                "No checkpoint for partition; starting from the default position"
            ),
        }
        Ok(checkpoint)
    }

    /// Processing of a partition stopped
    ///
    /// Returns whether the engine held state for it.
    pub fn partition_closing(
        &self,
        partition_id: &PartitionId,
        reason: ProcessingStoppedReason,
    ) -> bool {
        tracing::info!(partition_id = %partition_id, reason = %reason, "Partition closing");
        self.batching.notify_partition_lost(partition_id)
    }

    /// Classify and log an error raised while processing `partition_id`
    pub fn process_error(
        &self,
        partition_id: Option<&PartitionId>,
        error: &VitalStreamError,
    ) -> ErrorDisposition {
        let disposition = classify(error);
        let partition = partition_id.map(PartitionId::as_str).unwrap_or("-");

        match disposition {
            ErrorDisposition::Expected => tracing::debug!(
                partition_id = partition,
                error = %error,
                "Ignoring expected rebalancing error"
            ),
            ErrorDisposition::Failure => {
                log_error_with_context!(error, format!("processing partition {partition}"));
            }
        }
        disposition
    }
}

/// Rebalancing signals are expected; everything else is a failure
pub fn classify(error: &VitalStreamError) -> ErrorDisposition {
    match error {
        VitalStreamError::Broker(
            BrokerError::PartitionStolen(_)
            | BrokerError::ReceiverDisconnected(_)
            | BrokerError::LeaseLost(_)
            | BrokerError::ConsumerDisconnected(_),
        ) => ErrorDisposition::Expected,
        _ => ErrorDisposition::Failure,
    }
}
