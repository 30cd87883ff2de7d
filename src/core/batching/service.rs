//! Event batching service
//!
//! Routes each incoming event or maximum-wait signal to its partition's
//! window, decides whether to flush, delivers flushed batches to the consumer
//! service and checkpoints the last delivered event.
//!
//! # Flush rules
//!
//! - A data event later than `window_end` flushes everything buffered before
//!   it, then the window advances in whole timespans past the event.
//! - A queue that reaches `max_events` flushes immediately; the window is not
//!   advanced.
//! - A maximum-wait signal later than `window_end` flushes a non-empty queue
//!   and advances the window past the signal. A signal for a partition with
//!   no state creates an empty window anchored on the signal timestamp.
//!
//! A flush is committed (queue drained, window advanced) only after both the
//! delivery and the checkpoint succeed. Cancellation aborts delivery; a batch
//! that was delivered is always checkpointed. On failure or cancellation the
//! error is returned and the partition state is left as it was, except that
//! the incoming event has already been appended.
//!
//! # Concurrency
//!
//! Partition state lives in a [`DashMap`] of per-partition async mutexes. The
//! map shard lock is only held long enough to clone the entry; the partition
//! mutex is held for the whole call, so calls for one partition are serialized
//! while different partitions proceed independently.

use super::metrics::{BatchingMetrics, BatchingMetricsSnapshot, FlushTrigger};
use super::options::BatchingOptions;
use super::window::PartitionWindow;
use crate::core::checkpoint::CheckpointClient;
use crate::core::consumer::EventConsumerService;
use crate::domain::{
    EventMessage, IncomingEvent, MaximumWaitSignal, PartitionId, Result, VitalStreamError,
};
use crate::log_flush;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

type SharedWindow = Arc<Mutex<PartitionWindow>>;

/// Per-partition windowed batching engine
pub struct EventBatchingService {
    options: BatchingOptions,
    consumer_service: Arc<EventConsumerService>,
    checkpoint_client: Arc<dyn CheckpointClient>,
    partitions: DashMap<PartitionId, SharedWindow>,
    metrics: BatchingMetrics,
}

impl EventBatchingService {
    pub fn new(
        options: BatchingOptions,
        consumer_service: Arc<EventConsumerService>,
        checkpoint_client: Arc<dyn CheckpointClient>,
    ) -> Self {
        Self {
            options,
            consumer_service,
            checkpoint_client,
            partitions: DashMap::new(),
            metrics: BatchingMetrics::new(),
        }
    }

    pub fn options(&self) -> &BatchingOptions {
        &self.options
    }

    /// Accept one event or signal
    ///
    /// At most one call per partition should be in flight; callers must not
    /// resubmit an event after an error, since it is already buffered.
    ///
    /// # Errors
    ///
    /// - [`VitalStreamError::Cancelled`] when `cancel` fires before or during delivery
    /// - consumer and checkpoint errors from a failed flush
    pub async fn consume_event(
        &self,
        item: IncomingEvent,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(VitalStreamError::Cancelled);
        }

        match item {
            IncomingEvent::Data(event) => self.consume_data_event(event, cancel).await,
            IncomingEvent::MaximumWait(signal) => self.consume_signal(signal, cancel).await,
        }
    }

    async fn consume_data_event(
        &self,
        event: EventMessage,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.metrics.record_event();

        let window = self.window_for(&event.partition_id, event.enqueued_time);
        let mut state = window.lock().await;
        let enqueued_time = event.enqueued_time;

        if state.is_past_window(enqueued_time) {
            let flush_count = state.depth();
            let next_window_end = state.next_window_end(enqueued_time);
            state.enqueue(event);

            if flush_count > 0 {
                self.deliver(
                    &state.queue()[..flush_count],
                    FlushTrigger::WindowElapsed,
                    state.window_end(),
                    cancel,
                )
                .await?;
                state.commit_flush(flush_count);
            }
            state.advance_to(next_window_end);
        } else {
            state.enqueue(event);
        }

        if state.depth() >= self.options.max_events() {
            let flush_count = state.depth();
            self.deliver(
                &state.queue()[..flush_count],
                FlushTrigger::MaxEvents,
                state.window_end(),
                cancel,
            )
            .await?;
            state.commit_flush(flush_count);
        }

        Ok(())
    }

    async fn consume_signal(
        &self,
        signal: MaximumWaitSignal,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.metrics.record_signal();

        let window = self.window_for(&signal.partition_id, signal.timestamp);
        let mut state = window.lock().await;

        if state.is_empty() || !state.is_past_window(signal.timestamp) {
            return Ok(());
        }

        let flush_count = state.depth();
        let next_window_end = state.next_window_end(signal.timestamp);
        self.deliver(
            &state.queue()[..flush_count],
            FlushTrigger::MaximumWait,
            state.window_end(),
            cancel,
        )
        .await?;
        state.commit_flush(flush_count);
        state.advance_to(next_window_end);

        Ok(())
    }

    /// Hand `batch` to the consumers, then checkpoint its last event
    async fn deliver(
        &self,
        batch: &[EventMessage],
        trigger: FlushTrigger,
        window_end: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let Some(last) = batch.last() else {
            return Ok(());
        };

        // Once delivery succeeds the checkpoint is always written.
        let outcome = async {
            self.consumer_service.consume_events(batch, cancel).await?;
            self.checkpoint_client.set_checkpoint(last).await
        }
        .await;

        match outcome {
            Ok(()) => {
                self.metrics.record_flush(trigger, batch.len());
                log_flush!(last.partition_id, trigger, batch.len(), window_end);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failed_flush();
                if e.is_cancelled() {
                    tracing::warn!(
                        partition_id = %last.partition_id,
                        trigger = %trigger,
                        batch_size = batch.len(),
                        "Flush cancelled; partition state unchanged"
                    );
                } else {
                    tracing::error!(
                        partition_id = %last.partition_id,
                        trigger = %trigger,
                        batch_size = batch.len(),
                        window_end = %window_end,
                        error = %e,
                        "Flush failed; partition state unchanged"
                    );
                }
                Err(e)
            }
        }
    }

    fn window_for(&self, partition_id: &PartitionId, first_seen: DateTime<Utc>) -> SharedWindow {
        match self.partitions.entry(partition_id.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let window = PartitionWindow::new(
                    partition_id.clone(),
                    first_seen,
                    self.options.flush_timespan(),
                );
                tracing::debug!(
                    partition_id = %partition_id,
                    window_end = %window.window_end(),
                    "Partition window created"
                );
                let shared = Arc::new(Mutex::new(window));
                entry.insert(Arc::clone(&shared));
                shared
            }
        }
    }

    fn existing_window(&self, partition_id: &PartitionId) -> Option<SharedWindow> {
        self.partitions
            .get(partition_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Discard any state left from a previous ownership of `partition_id`
    ///
    /// The next event or signal for the partition starts a fresh window.
    pub fn notify_partition_acquired(&self, partition_id: &PartitionId) {
        self.metrics.record_partition_acquired();
        if self.partitions.remove(partition_id).is_some() {
            tracing::info!(
                partition_id = %partition_id,
                "Discarded stale partition state on acquire"
            );
        } else {
            tracing::debug!(partition_id = %partition_id, "Partition acquired");
        }
    }

    /// Drop the state of a revoked partition without flushing
    ///
    /// Returns whether state existed. Buffered events are redelivered by the
    /// next owner from the last checkpoint.
    pub fn notify_partition_lost(&self, partition_id: &PartitionId) -> bool {
        self.metrics.record_partition_lost();
        let existed = self.partitions.remove(partition_id).is_some();
        tracing::info!(
            partition_id = %partition_id,
            had_state = existed,
            "Partition lost"
        );
        existed
    }

    pub fn partition_exists(&self, partition_id: &PartitionId) -> bool {
        self.partitions.contains_key(partition_id)
    }

    /// Current window end, or `None` for an unknown partition
    pub async fn partition_window_end(&self, partition_id: &PartitionId) -> Option<DateTime<Utc>> {
        let window = self.existing_window(partition_id)?;
        let state = window.lock().await;
        Some(state.window_end())
    }

    /// Buffered event count, zero for an unknown partition
    pub async fn partition_queue_depth(&self, partition_id: &PartitionId) -> usize {
        match self.existing_window(partition_id) {
            Some(window) => window.lock().await.depth(),
            None => 0,
        }
    }

    /// Partitions that currently hold state, sorted
    pub fn active_partitions(&self) -> Vec<PartitionId> {
        let mut partitions: Vec<PartitionId> =
            self.partitions.iter().map(|entry| entry.key().clone()).collect();
        partitions.sort();
        partitions
    }

    pub fn metrics(&self) -> BatchingMetricsSnapshot {
        self.metrics.snapshot()
    }
}
