//! Batching engine counters
//!
//! Lock-free counters updated on the hot path and read as a serializable
//! snapshot for status output and structured logs.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Why a partition's queue was flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushTrigger {
    /// A data event arrived after the window ended
    WindowElapsed,
    /// The queue reached the configured maximum
    MaxEvents,
    /// A maximum-wait signal found an expired window
    MaximumWait,
}

impl FlushTrigger {
    /// Stable name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushTrigger::WindowElapsed => "window_elapsed",
            FlushTrigger::MaxEvents => "max_events",
            FlushTrigger::MaximumWait => "maximum_wait",
        }
    }
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine counters
#[derive(Debug, Default)]
pub struct BatchingMetrics {
    events_received: AtomicU64,
    signals_received: AtomicU64,
    window_flushes: AtomicU64,
    size_flushes: AtomicU64,
    maximum_wait_flushes: AtomicU64,
    events_flushed: AtomicU64,
    checkpoints_requested: AtomicU64,
    failed_flushes: AtomicU64,
    partitions_acquired: AtomicU64,
    partitions_lost: AtomicU64,
}

impl BatchingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_signal(&self) {
        self.signals_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful flush and the checkpoint that followed it
    pub fn record_flush(&self, trigger: FlushTrigger, batch_size: usize) {
        let counter = match trigger {
            FlushTrigger::WindowElapsed => &self.window_flushes,
            FlushTrigger::MaxEvents => &self.size_flushes,
            FlushTrigger::MaximumWait => &self.maximum_wait_flushes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.events_flushed
            .fetch_add(batch_size as u64, Ordering::Relaxed);
        self.checkpoints_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_flush(&self) {
        self.failed_flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_partition_acquired(&self) {
        self.partitions_acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_partition_lost(&self) {
        self.partitions_lost.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> BatchingMetricsSnapshot {
        BatchingMetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            signals_received: self.signals_received.load(Ordering::Relaxed),
            window_flushes: self.window_flushes.load(Ordering::Relaxed),
            size_flushes: self.size_flushes.load(Ordering::Relaxed),
            maximum_wait_flushes: self.maximum_wait_flushes.load(Ordering::Relaxed),
            events_flushed: self.events_flushed.load(Ordering::Relaxed),
            checkpoints_requested: self.checkpoints_requested.load(Ordering::Relaxed),
            failed_flushes: self.failed_flushes.load(Ordering::Relaxed),
            partitions_acquired: self.partitions_acquired.load(Ordering::Relaxed),
            partitions_lost: self.partitions_lost.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of [`BatchingMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchingMetricsSnapshot {
    pub events_received: u64,
    pub signals_received: u64,
    pub window_flushes: u64,
    pub size_flushes: u64,
    pub maximum_wait_flushes: u64,
    pub events_flushed: u64,
    pub checkpoints_requested: u64,
    pub failed_flushes: u64,
    pub partitions_acquired: u64,
    pub partitions_lost: u64,
}

impl BatchingMetricsSnapshot {
    /// Flushes of any trigger
    pub fn total_flushes(&self) -> u64 {
        self.window_flushes + self.size_flushes + self.maximum_wait_flushes
    }
}
