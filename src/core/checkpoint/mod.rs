//! Checkpoint persistence
//!
//! - [`Checkpoint`] / [`CheckpointPaths`] - record format and blob naming
//! - [`SourceIdentity`] - which namespace and event hub checkpoints belong to
//! - [`CheckpointClient`] / [`StorageCheckpointClient`] - read, write and reset
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitalstream::adapters::blob::InMemoryBlobStore;
//! use vitalstream::core::checkpoint::{CheckpointClient, SourceIdentity, StorageCheckpointClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let identity = SourceIdentity::new("ns.servicebus.windows.net", "vitals", "$default")?;
//! let client = StorageCheckpointClient::new(Arc::new(InMemoryBlobStore::new()), "iomt", identity, 1);
//!
//! let purged = client.reset_checkpoints().await?;
//! println!("purged {purged} stale checkpoints");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod identity;
pub mod record;

pub use client::{CheckpointClient, StorageCheckpointClient};
pub use identity::{SourceIdentity, DEFAULT_CONSUMER_GROUP};
pub use record::{Checkpoint, CheckpointPaths};
