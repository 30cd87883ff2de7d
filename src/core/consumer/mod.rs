//! Downstream consumer capability and delivery service
//!
//! The batching engine hands every flushed batch to an [`EventConsumerService`],
//! which forwards it to each registered [`EventConsumer`] with bounded retry.

pub mod retry;
pub mod service;

pub use retry::RetryPolicy;
pub use service::EventConsumerService;

use crate::domain::{EventMessage, Result};
use async_trait::async_trait;

/// A downstream recipient of flushed batches
///
/// Implementations should be idempotent: a batch can be delivered more than
/// once when a flush is retried or a partition moves to another processor.
#[async_trait]
pub trait EventConsumer: Send + Sync {
    /// Name used in logs and aggregate errors
    fn name(&self) -> &str;

    /// Process one batch, in partition order
    ///
    /// Returning [`crate::domain::VitalStreamError::Cancelled`] stops delivery
    /// without retry.
    async fn consume(&self, events: &[EventMessage]) -> Result<()>;
}
