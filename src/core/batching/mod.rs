//! Per-partition windowed batching
//!
//! - [`BatchingOptions`] - window length and size ceiling
//! - [`PartitionWindow`] - buffered events and window bounds for one partition
//! - [`EventBatchingService`] - flush policy, delivery and checkpoint coordination
//! - [`BatchingMetrics`] - engine counters

pub mod metrics;
pub mod options;
pub mod service;
pub mod window;

pub use metrics::{BatchingMetrics, BatchingMetricsSnapshot, FlushTrigger};
pub use options::{BatchingOptions, DEFAULT_FLUSH_TIMESPAN_SECS, DEFAULT_MAX_EVENTS};
pub use service::EventBatchingService;
pub use window::PartitionWindow;
