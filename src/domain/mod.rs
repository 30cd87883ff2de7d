//! Domain models and types for VitalStream.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`PartitionId`])
//! - **Event model** ([`EventMessage`], [`MaximumWaitSignal`], [`IncomingEvent`])
//! - **Error types** ([`VitalStreamError`], [`ConsumerError`], [`CheckpointError`], [`BrokerError`])
//! - **Result type alias** ([`Result`]) and the [`ResultExt`] context trait
//!
//! # Control signals
//!
//! Data events and maximum-wait signals share one sum type so the batching
//! engine can dispatch on the variant:
//!
//! ```rust
//! use vitalstream::domain::{IncomingEvent, MaximumWaitSignal, PartitionId};
//! use chrono::Utc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signal = MaximumWaitSignal::new(PartitionId::new("2")?, Utc::now());
//! let item = IncomingEvent::from(signal);
//!
//! match item {
//!     IncomingEvent::Data(event) => println!("event {}", event.sequence_number),
//!     IncomingEvent::MaximumWait(signal) => println!("check {}", signal.partition_id),
//! }
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod errors;
pub mod event;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use context::ResultExt;
pub use errors::{BrokerError, CheckpointError, ConsumerError, ConsumerFailure, VitalStreamError};
pub use event::{EventMessage, EventMessageBuilder, IncomingEvent, MaximumWaitSignal};
pub use ids::PartitionId;
pub use result::Result;
