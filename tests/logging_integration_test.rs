//! Integration tests for logging functionality
//!
//! The global subscriber can only be installed once per process, so a single
//! test covers initialization and the file sink.

use chrono::Utc;
use tempfile::TempDir;
use vitalstream::config::LoggingConfig;
use vitalstream::core::batching::FlushTrigger;
use vitalstream::domain::{PartitionId, VitalStreamError};
use vitalstream::logging::{init_logging, parse_log_level};
use vitalstream::{log_checkpoint, log_error_with_context, log_flush, log_retry_attempt};

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_path, "./logs");
    assert_eq!(config.local_rotation, "daily");
    assert!(!config.console_json);
}

#[test]
fn test_invalid_level_is_rejected_before_install() {
    let config = LoggingConfig {
        local_enabled: false,
        ..LoggingConfig::default()
    };
    let err = init_logging("loud", &config).unwrap_err();
    assert!(matches!(err, VitalStreamError::Configuration(_)));
    assert!(parse_log_level("WARN").is_ok());
}

#[test]
fn test_file_logging_writes_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
        console_json: true,
    };

    let guard = init_logging("debug", &config).expect("logging should initialize once");
    assert!(log_path.exists());

    let partition_id = PartitionId::new("0").unwrap();
    let window_end = Utc::now();
    log_flush!(partition_id, FlushTrigger::MaxEvents, 3, window_end);
    log_checkpoint!(partition_id, 42, "4096", 1);
    log_retry_attempt!("archive", 1, 4, "connection reset");
    log_error_with_context!(
        VitalStreamError::Storage("disk full".to_string()),
        "writing checkpoint"
    );

    // Dropping the guard flushes the non-blocking writer.
    drop(guard);

    let contents = std::fs::read_to_string(log_path.join("vitalstream.log")).unwrap();
    // The default filter only admits the library's own target.
    assert!(contents.contains("Logging initialized"));
    for line in contents.lines() {
        serde_json::from_str::<serde_json::Value>(line).expect("each log line is JSON");
    }

    // A second install fails instead of silently replacing the subscriber.
    assert!(init_logging("info", &config).is_err());
}
