//! Per-partition event pump
//!
//! Feeds one partition's events into the batching engine in order. When the
//! partition stays idle for `max_wait`, a maximum-wait signal stamped with the
//! current time is injected so a quiet partition still flushes once its
//! window has elapsed.

use crate::core::batching::EventBatchingService;
use crate::core::lifecycle::{ErrorDisposition, PartitionLifecycleNotifier, ProcessingStoppedReason};
use crate::domain::{EventMessage, IncomingEvent, MaximumWaitSignal, PartitionId, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Outcome of one pump run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PumpSummary {
    pub partition_id: PartitionId,
    /// Data events handed to the engine
    pub events: u64,
    /// Events at or before the stored checkpoint, not handed to the engine
    pub skipped: u64,
    /// Maximum-wait signals injected
    pub signals: u64,
    /// Events still buffered when the pump stopped; never checkpointed
    pub buffered: usize,
}

impl PumpSummary {
    fn new(partition_id: PartitionId) -> Self {
        Self {
            partition_id,
            events: 0,
            skipped: 0,
            signals: 0,
            buffered: 0,
        }
    }

    /// Events delivered to the consumers
    pub fn flushed(&self) -> u64 {
        self.events.saturating_sub(self.buffered as u64)
    }
}

/// Drives a single partition through the batching engine
pub struct PartitionPump {
    partition_id: PartitionId,
    batching: Arc<EventBatchingService>,
    lifecycle: Arc<PartitionLifecycleNotifier>,
    max_wait: Duration,
}

impl PartitionPump {
    pub fn new(
        partition_id: PartitionId,
        batching: Arc<EventBatchingService>,
        lifecycle: Arc<PartitionLifecycleNotifier>,
        max_wait: Duration,
    ) -> Self {
        Self {
            partition_id,
            batching,
            lifecycle,
            max_wait,
        }
    }

    /// Run until the channel closes or `cancel` fires
    ///
    /// Claims the partition first and skips events at or before the stored
    /// checkpoint. Expected rebalancing errors are logged and processing
    /// continues; any other error stops the pump and is returned. The
    /// partition is released on every exit path.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<EventMessage>,
        cancel: CancellationToken,
    ) -> Result<PumpSummary> {
        let mut summary = PumpSummary::new(self.partition_id.clone());
        let resume_after = self
            .lifecycle
            .partition_initializing(&self.partition_id)
            .await?
            .map(|checkpoint| checkpoint.sequence_number);

        let outcome = self
            .pump(&mut events, &cancel, resume_after, &mut summary)
            .await;

        summary.buffered = self.batching.partition_queue_depth(&self.partition_id).await;
        self.lifecycle
            .partition_closing(&self.partition_id, ProcessingStoppedReason::Shutdown);

        tracing::info!(
            partition_id = %self.partition_id,
            events = summary.events,
            skipped = summary.skipped,
            signals = summary.signals,
            buffered = summary.buffered,
            "Partition pump stopped"
        );

        outcome.map(|()| summary)
    }

    async fn pump(
        &self,
        events: &mut mpsc::Receiver<EventMessage>,
        cancel: &CancellationToken,
        resume_after: Option<i64>,
        summary: &mut PumpSummary,
    ) -> Result<()> {
        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                received = tokio::time::timeout(self.max_wait, events.recv()) => received,
            };

            let item = match received {
                Ok(Some(event)) => {
                    if event.partition_id != self.partition_id {
                        tracing::warn!(
                            partition_id = %self.partition_id,
                            event_partition_id = %event.partition_id,
                            sequence_number = event.sequence_number,
                            "Dropping event routed to the wrong partition"
                        );
                        continue;
                    }
                    if resume_after.is_some_and(|seq| event.sequence_number <= seq) {
                        summary.skipped += 1;
                        continue;
                    }
                    summary.events += 1;
                    IncomingEvent::Data(event)
                }
                Ok(None) => return Ok(()),
                Err(_) => {
                    summary.signals += 1;
                    IncomingEvent::MaximumWait(MaximumWaitSignal::new(
                        self.partition_id.clone(),
                        Utc::now(),
                    ))
                }
            };

            if let Err(error) = self.batching.consume_event(item, cancel).await {
                if error.is_cancelled() {
                    return Ok(());
                }
                match self.lifecycle.process_error(Some(&self.partition_id), &error) {
                    ErrorDisposition::Expected => continue,
                    ErrorDisposition::Failure => return Err(error),
                }
            }
        }
    }
}
