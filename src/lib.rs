// VitalStream - IoMT telemetry event batching engine
// Copyright (c) 2025 VitalStream Contributors
// Licensed under the MIT License

//! # VitalStream - Event batching for IoMT telemetry
//!
//! VitalStream groups device telemetry arriving on a partitioned event stream
//! into time windows, delivers each closed window to a set of downstream
//! consumers and checkpoints the last delivered event of every partition.
//!
//! ## Overview
//!
//! - **Windowing** per partition, anchored on the first event's enqueued time
//! - **Size-triggered** flushes once a partition buffers `max_events` events
//! - **Maximum-wait signals** that close windows on idle partitions
//! - **Retrying fan-out** to every registered consumer
//! - **Checkpoints** written only after every consumer accepted a batch
//!
//! ## Architecture
//!
//! - [`domain`] - identifiers, the event model and the error hierarchy
//! - [`core`] - batching engine, consumer service, checkpoints, lifecycle
//! - [`adapters`] - blob stores and concrete consumers
//! - [`host`] - per-partition pumps and the JSON-lines replay source
//! - [`config`] - configuration management
//! - [`logging`] - structured logging
//! - [`cli`] - command-line interface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vitalstream::config::load_config;
//! use vitalstream::host::Engine;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("vitalstream.toml")?;
//!     let engine = Engine::from_config(&config)?;
//!
//!     let report = engine
//!         .replay_source()
//!         .replay_file("events.jsonl", &CancellationToken::new())
//!         .await?;
//!
//!     println!("Flushed {} events", report.total_flushed());
//!     Ok(())
//! }
//! ```
//!
//! ## Delivery Guarantees
//!
//! Delivery is at-least-once. A window is drained only after every consumer
//! succeeded and the checkpoint write completed; a failure or cancellation
//! leaves the partition state untouched so the events are delivered again.
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`], whose error type is
//! [`domain::VitalStreamError`]:
//!
//! ```rust,no_run
//! use vitalstream::domain::VitalStreamError;
//!
//! fn example() -> Result<(), VitalStreamError> {
//!     let config = vitalstream::config::load_config("vitalstream.toml")?;
//!     let _identity = config.event_hub.source_identity()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Every module logs through `tracing` with structured fields such as
//! `partition_id`, `trigger`, `batch_size` and `window_end`.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod host;
pub mod logging;
