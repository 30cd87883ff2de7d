//! Configuration management for VitalStream.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! VitalStream uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `VITALSTREAM_<SECTION>_<KEY>` environment overrides
//! - Default values for every optional section
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vitalstream::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vitalstream.toml")?;
//!
//! let identity = config.event_hub.source_identity()?;
//! println!("Checkpointing for {identity}");
//! println!("Window: {}s", config.batching.flush_timespan_seconds);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level
//! - [`EventHubConfig`] - source identity and idle wait
//! - [`BatchingConfig`] - window length and size threshold
//! - [`ConsumerConfig`] - downstream consumers and retry policy
//! - [`CheckpointConfig`] - blob prefix, write frequency and store
//! - [`LoggingConfig`] - console and rolling file output
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [event_hub]
//! connection_string = "${VITALSTREAM_CONNECTION_STRING}"
//! consumer_group = "$Default"
//! max_wait_seconds = 60
//!
//! [batching]
//! flush_timespan_seconds = 300
//! max_events = 500
//!
//! [consumer.retry]
//! max_retries = 3
//! initial_delay_ms = 1000
//!
//! [[consumer.outputs]]
//! name = "archive"
//! type = "jsonl"
//! path = "./output/events.jsonl"
//!
//! [checkpoint]
//! blob_prefix = "vitalstream"
//! store = "filesystem"
//! storage_path = "./checkpoints"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, BatchingConfig, CheckpointConfig, CheckpointStoreKind, ConsumerConfig,
    EventHubConfig, LoggingConfig, OutputConfig, OutputKind, RetryConfig, VitalStreamConfig,
};
pub use secret::{redact_connection_string, secret_string, SecretString, SecretValue};
