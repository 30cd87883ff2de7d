//! Configuration schema types
//!
//! Maps the TOML file onto typed sections. Every section except `[event_hub]`
//! has defaults, so a minimal file only names the source.

use crate::config::SecretString;
use crate::core::batching::{BatchingOptions, DEFAULT_FLUSH_TIMESPAN_SECS, DEFAULT_MAX_EVENTS};
use crate::core::checkpoint::{SourceIdentity, DEFAULT_CONSUMER_GROUP};
use crate::core::consumer::RetryPolicy;
use crate::domain::Result as DomainResult;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main VitalStream configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalStreamConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Event source settings
    pub event_hub: EventHubConfig,

    /// Window and size policy
    #[serde(default)]
    pub batching: BatchingConfig,

    /// Downstream consumers and their retry policy
    #[serde(default)]
    pub consumer: ConsumerConfig,

    /// Checkpoint storage
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VitalStreamConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.event_hub.validate()?;
        self.batching.validate()?;
        self.consumer.validate()?;
        self.checkpoint.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Event Hubs source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventHubConfig {
    /// Connection string; stored securely and zeroized on drop
    #[serde(default)]
    pub connection_string: Option<SecretString>,

    /// Namespace host, overrides the connection string Endpoint
    #[serde(default)]
    pub fully_qualified_namespace: Option<String>,

    /// Event hub name, overrides the connection string EntityPath
    #[serde(default)]
    pub event_hub_name: Option<String>,

    /// Consumer group
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,

    /// Idle time after which a maximum-wait signal is injected
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: u64,
}

impl EventHubConfig {
    /// Namespace, event hub and consumer group the checkpoints belong to
    ///
    /// # Errors
    ///
    /// Returns a validation error if the namespace or event hub name cannot
    /// be derived.
    pub fn source_identity(&self) -> DomainResult<SourceIdentity> {
        let connection_string = self
            .connection_string
            .as_ref()
            .map(|secret| secret.expose_secret().as_ref().to_string());

        SourceIdentity::resolve(
            self.fully_qualified_namespace.as_deref(),
            self.event_hub_name.as_deref(),
            connection_string.as_deref(),
            &self.consumer_group,
        )
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_seconds)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_wait_seconds == 0 {
            return Err("event_hub.max_wait_seconds must be > 0".to_string());
        }
        self.source_identity().map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Batching policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchingConfig {
    /// Window length in seconds
    #[serde(default = "default_flush_timespan_seconds")]
    pub flush_timespan_seconds: u64,

    /// Queue size that forces an immediate flush
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

impl BatchingConfig {
    pub fn to_options(&self) -> DomainResult<BatchingOptions> {
        BatchingOptions::new(self.flush_timespan_seconds, self.max_events)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_events > 100_000 {
            return Err(format!(
                "batching.max_events must be <= 100000, got {}",
                self.max_events
            ));
        }
        self.to_options().map(|_| ()).map_err(|e| e.to_string())
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            flush_timespan_seconds: default_flush_timespan_seconds(),
            max_events: default_max_events(),
        }
    }
}

/// Consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Retry policy applied to every consumer
    #[serde(default)]
    pub retry: RetryConfig,

    /// Consumers receiving flushed batches
    #[serde(default = "default_outputs")]
    pub outputs: Vec<OutputConfig>,
}

impl ConsumerConfig {
    fn validate(&self) -> Result<(), String> {
        self.retry.validate()?;
        if self.outputs.is_empty() {
            return Err("consumer.outputs must list at least one consumer".to_string());
        }
        let mut names = std::collections::HashSet::new();
        for output in &self.outputs {
            if output.name.trim().is_empty() {
                return Err("consumer.outputs[].name cannot be empty".to_string());
            }
            if !names.insert(output.name.as_str()) {
                return Err(format!("Duplicate consumer name '{}'", output.name));
            }
            if output.kind == OutputKind::Jsonl && output.path.is_none() {
                return Err(format!(
                    "Consumer '{}' of type jsonl requires a path",
                    output.name
                ));
            }
        }
        Ok(())
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            outputs: default_outputs(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_retries > 20 {
            return Err(format!(
                "consumer.retry.max_retries must be <= 20, got {}",
                self.max_retries
            ));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(
                "consumer.retry.max_delay_ms must be >= consumer.retry.initial_delay_ms"
                    .to_string(),
            );
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err("consumer.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Consumer implementation selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Structured log line per batch
    Log,
    /// JSON-lines file
    Jsonl,
}

/// One downstream consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Name used in logs and errors
    pub name: String,

    /// Consumer implementation
    #[serde(rename = "type")]
    pub kind: OutputKind,

    /// Output file (jsonl only)
    #[serde(default)]
    pub path: Option<String>,
}

/// Checkpoint store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointStoreKind {
    /// Files under `storage_path`
    #[default]
    Filesystem,
    /// Process memory; lost on exit
    Memory,
}

/// Checkpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Application prefix for checkpoint blob names
    #[serde(default = "default_blob_prefix")]
    pub blob_prefix: String,

    /// Flushes per durable checkpoint write
    #[serde(default = "default_batch_frequency")]
    pub batch_frequency: u32,

    /// Storage backend
    #[serde(default)]
    pub store: CheckpointStoreKind,

    /// Root directory for the filesystem backend
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
}

impl CheckpointConfig {
    fn validate(&self) -> Result<(), String> {
        if self.batch_frequency == 0 {
            return Err("checkpoint.batch_frequency must be >= 1".to_string());
        }
        if self.blob_prefix.split('/').any(|segment| segment == "..") {
            return Err("checkpoint.blob_prefix cannot contain '..'".to_string());
        }
        if self.store == CheckpointStoreKind::Filesystem && self.storage_path.trim().is_empty() {
            return Err("checkpoint.storage_path is required for the filesystem store".to_string());
        }
        Ok(())
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            blob_prefix: default_blob_prefix(),
            batch_frequency: default_batch_frequency(),
            store: CheckpointStoreKind::default(),
            storage_path: default_storage_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Emit console logs as JSON instead of text
    #[serde(default)]
    pub console_json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path is required when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            console_json: false,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_consumer_group() -> String {
    DEFAULT_CONSUMER_GROUP.to_string()
}

fn default_max_wait_seconds() -> u64 {
    60
}

fn default_flush_timespan_seconds() -> u64 {
    DEFAULT_FLUSH_TIMESPAN_SECS
}

fn default_max_events() -> usize {
    DEFAULT_MAX_EVENTS
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_outputs() -> Vec<OutputConfig> {
    vec![OutputConfig {
        name: "log".to_string(),
        kind: OutputKind::Log,
        path: None,
    }]
}

fn default_blob_prefix() -> String {
    "vitalstream".to_string()
}

fn default_batch_frequency() -> u32 {
    1
}

fn default_storage_path() -> String {
    "./checkpoints".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn event_hub() -> EventHubConfig {
        EventHubConfig {
            connection_string: Some(secret_string(
                "Endpoint=sb://ns.servicebus.windows.net/;SharedAccessKeyName=l;SharedAccessKey=k;EntityPath=vitals"
                    .to_string(),
            )),
            fully_qualified_namespace: None,
            event_hub_name: None,
            consumer_group: default_consumer_group(),
            max_wait_seconds: 60,
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_event_hub_identity_from_connection_string() {
        let identity = event_hub().source_identity().unwrap();
        assert_eq!(identity.namespace(), "ns.servicebus.windows.net");
        assert_eq!(identity.entity(), "vitals");
        assert_eq!(identity.consumer_group(), "$default");
    }

    #[test]
    fn test_event_hub_without_identity_fails() {
        let mut config = event_hub();
        config.connection_string = None;
        let err = config.validate().unwrap_err();
        assert!(err.contains("namespace"));
    }

    #[test]
    fn test_batching_config_validation() {
        let mut config = BatchingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.to_options().unwrap().max_events(), 500);

        config.flush_timespan_seconds = 0;
        assert!(config.validate().is_err());

        config.flush_timespan_seconds = 300;
        config.max_events = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_to_policy() {
        let policy = RetryConfig::default().to_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(1000));
        assert_eq!(policy.max_delay, Duration::from_millis(30000));
    }

    #[test]
    fn test_retry_config_validation() {
        let mut config = RetryConfig::default();
        config.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        config.backoff_multiplier = 2.0;
        config.max_delay_ms = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_consumer_outputs_validation() {
        let mut config = ConsumerConfig::default();
        assert!(config.validate().is_ok());

        config.outputs.push(OutputConfig {
            name: "archive".to_string(),
            kind: OutputKind::Jsonl,
            path: None,
        });
        assert!(config.validate().unwrap_err().contains("requires a path"));

        config.outputs[1].path = Some("./out.jsonl".to_string());
        config.outputs[1].name = "log".to_string();
        assert!(config.validate().unwrap_err().contains("Duplicate"));
    }

    #[test]
    fn test_checkpoint_config_validation() {
        let mut config = CheckpointConfig::default();
        assert!(config.validate().is_ok());

        config.batch_frequency = 0;
        assert!(config.validate().is_err());

        config.batch_frequency = 5;
        config.blob_prefix = "../escape".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }
}
