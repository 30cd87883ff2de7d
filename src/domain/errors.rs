//! Domain error types
//!
//! This module defines the error hierarchy for VitalStream. Errors are
//! domain-specific and don't expose third-party types, so adapters translate
//! their failures into one of these variants before returning them.

use thiserror::Error;

/// Main VitalStream error type
///
/// This is the primary error type used throughout the library. It wraps the
/// consumer, checkpoint and broker error families and adds the cross-cutting
/// configuration, storage and cancellation conditions.
#[derive(Debug, Error)]
pub enum VitalStreamError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parameter validation errors (missing identity components, bad ids)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Downstream consumer errors
    #[error("Consumer error: {0}")]
    Consumer(#[from] ConsumerError),

    /// Checkpoint persistence errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Errors reported by the broker-integration layer
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Blob storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// The operation was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl VitalStreamError {
    /// Returns true if this error is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VitalStreamError::Cancelled)
    }
}

/// Downstream consumer errors
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// A single consumer invocation failed
    #[error("Consumer '{consumer}' failed: {message}")]
    Failed {
        /// Consumer name
        consumer: String,
        /// Failure description
        message: String,
    },

    /// One or more consumers exhausted their retries
    #[error("{} consumer(s) failed after retries: {}", .0.len(), summarize(.0))]
    Aggregate(Vec<ConsumerFailure>),
}

impl ConsumerError {
    /// Convenience constructor for a single consumer failure
    pub fn failed(consumer: impl Into<String>, message: impl Into<String>) -> Self {
        ConsumerError::Failed {
            consumer: consumer.into(),
            message: message.into(),
        }
    }
}

/// A consumer that failed every attempt for a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerFailure {
    /// Consumer name
    pub consumer: String,

    /// Number of invocations made, including the first
    pub attempts: usize,

    /// Error returned by the last attempt
    pub last_error: String,
}

fn summarize(failures: &[ConsumerFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({} attempts): {}", f.consumer, f.attempts, f.last_error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checkpoint persistence errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Writing a checkpoint failed
    #[error("Failed to write checkpoint for partition {partition_id}: {message}")]
    WriteFailed {
        /// Partition the checkpoint belongs to
        partition_id: String,
        /// Failure description
        message: String,
    },

    /// Reading a checkpoint failed
    #[error("Failed to read checkpoint: {0}")]
    ReadFailed(String),

    /// A stored checkpoint could not be decoded
    #[error("Invalid checkpoint record at {blob}: {message}")]
    InvalidRecord {
        /// Blob name of the record
        blob: String,
        /// Decoding failure
        message: String,
    },

    /// Deleting stale checkpoints failed
    #[error("Failed to delete checkpoint {blob}: {message}")]
    DeleteFailed {
        /// Blob name of the record
        blob: String,
        /// Failure description
        message: String,
    },
}

/// Errors surfaced by the broker-integration layer
///
/// The first four variants describe normal partition rebalancing and are
/// classified as expected by the lifecycle notifier.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Another processor claimed the partition
    #[error("Partition stolen: {0}")]
    PartitionStolen(String),

    /// The receiver was disconnected because a newer receiver took over
    #[error("Receiver disconnected: {0}")]
    ReceiverDisconnected(String),

    /// The ownership lease expired or was lost
    #[error("Lease lost: {0}")]
    LeaseLost(String),

    /// The consumer was disconnected by the service
    #[error("Consumer disconnected: {0}")]
    ConsumerDisconnected(String),

    /// The service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other broker failure
    #[error("{0}")]
    Other(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for VitalStreamError {
    fn from(err: std::io::Error) -> Self {
        VitalStreamError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for VitalStreamError {
    fn from(err: serde_json::Error) -> Self {
        VitalStreamError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for VitalStreamError {
    fn from(err: toml::de::Error) -> Self {
        VitalStreamError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VitalStreamError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_consumer_error_conversion() {
        let err: VitalStreamError = ConsumerError::failed("fhir", "timeout").into();
        assert!(matches!(err, VitalStreamError::Consumer(_)));
        assert!(err.to_string().contains("fhir"));
    }

    #[test]
    fn test_aggregate_error_lists_every_consumer() {
        let err = ConsumerError::Aggregate(vec![
            ConsumerFailure {
                consumer: "normalize".to_string(),
                attempts: 4,
                last_error: "boom".to_string(),
            },
            ConsumerFailure {
                consumer: "archive".to_string(),
                attempts: 4,
                last_error: "disk full".to_string(),
            },
        ]);

        let message = err.to_string();
        assert!(message.starts_with("2 consumer(s) failed"));
        assert!(message.contains("normalize (4 attempts): boom"));
        assert!(message.contains("archive (4 attempts): disk full"));
    }

    #[test]
    fn test_checkpoint_error_conversion() {
        let err: VitalStreamError = CheckpointError::WriteFailed {
            partition_id: "3".to_string(),
            message: "403".to_string(),
        }
        .into();
        assert!(matches!(err, VitalStreamError::Checkpoint(_)));
        assert!(err.to_string().contains("partition 3"));
    }

    #[test]
    fn test_broker_error_conversion() {
        let err: VitalStreamError = BrokerError::LeaseLost("lease expired".to_string()).into();
        assert!(matches!(err, VitalStreamError::Broker(BrokerError::LeaseLost(_))));
    }

    #[test]
    fn test_cancelled() {
        assert!(VitalStreamError::Cancelled.is_cancelled());
        assert!(!VitalStreamError::Other("x".to_string()).is_cancelled());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: VitalStreamError = io_err.into();
        assert!(matches!(err, VitalStreamError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: VitalStreamError = json_err.into();
        assert!(matches!(err, VitalStreamError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: VitalStreamError = toml_err.into();
        assert!(matches!(err, VitalStreamError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
