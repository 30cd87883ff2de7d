//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - JSON-formatted file logs with rotation
//! - Configurable log levels
//! - Helper macros carrying the batching engine's standard fields
//!
//! # Example
//!
//! ```no_run
//! use vitalstream::logging::init_logging;
//! use vitalstream::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(partition_id = "0", "Partition acquired");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log a completed flush
///
/// # Example
///
/// ```no_run
/// use vitalstream::log_flush;
/// use chrono::Utc;
///
/// log_flush!("3", "window_elapsed", 120, Utc::now());
/// ```
#[macro_export]
macro_rules! log_flush {
    ($partition_id:expr, $trigger:expr, $batch_size:expr, $window_end:expr) => {
        tracing::info!(
            partition_id = %$partition_id,
            trigger = %$trigger,
            batch_size = $batch_size,
            window_end = %$window_end,
            "Flushed partition batch"
        );
    };
}

/// Log a checkpoint write
///
/// # Example
///
/// ```no_run
/// use vitalstream::log_checkpoint;
///
/// log_checkpoint!("3", 1042, "88320", 7);
/// ```
#[macro_export]
macro_rules! log_checkpoint {
    ($partition_id:expr, $sequence_number:expr, $offset:expr, $epoch:expr) => {
        tracing::debug!(
            partition_id = %$partition_id,
            sequence_number = $sequence_number,
            offset = %$offset,
            epoch = $epoch,
            "Checkpoint written"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use vitalstream::log_error_with_context;
/// use vitalstream::domain::VitalStreamError;
///
/// let error = VitalStreamError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = %$context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use vitalstream::log_retry_attempt;
///
/// log_retry_attempt!("fhir-normalizer", 2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($consumer:expr, $attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            consumer = %$consumer,
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying consumer"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::VitalStreamError;
    use chrono::Utc;

    #[test]
    fn test_macros_expand() {
        let error = VitalStreamError::Other("boom".to_string());
        crate::log_flush!("0", "max_events", 10usize, Utc::now());
        crate::log_checkpoint!("0", 12i64, "4096", 1u64);
        crate::log_error_with_context!(&error, "flush failed");
        crate::log_retry_attempt!("archive", 1usize, 4usize, &error);
    }
}
