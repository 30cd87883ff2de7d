//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{CheckpointStoreKind, VitalStreamConfig};
use super::secret::secret_string;
use crate::domain::errors::VitalStreamError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into VitalStreamConfig
/// 4. Applies environment variable overrides (VITALSTREAM_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read or parsed, a
/// referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use vitalstream::config::loader::load_config;
///
/// let config = load_config("vitalstream.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<VitalStreamConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(VitalStreamError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        VitalStreamError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Parses, overrides and validates configuration from TOML text
pub fn load_config_from_str(contents: &str) -> Result<VitalStreamConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: VitalStreamConfig = toml::from_str(&contents)
        .map_err(|e| VitalStreamError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        VitalStreamError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn placeholder_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = PATTERN.get() {
        return Ok(re);
    }
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| VitalStreamError::Other(format!("Invalid placeholder pattern: {e}")))?;
    Ok(PATTERN.get_or_init(|| re))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = placeholder_pattern()?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(VitalStreamError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| {
            VitalStreamError::Configuration(format!("Invalid value for {name}: '{value}'"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using VITALSTREAM_* prefix
///
/// Environment variables follow the pattern: VITALSTREAM_<SECTION>_<KEY>,
/// for example VITALSTREAM_BATCHING_MAX_EVENTS. Unparseable numeric or
/// boolean values are rejected.
fn apply_env_overrides(config: &mut VitalStreamConfig) -> Result<()> {
    if let Ok(val) = std::env::var("VITALSTREAM_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Event hub overrides
    if let Ok(val) = std::env::var("VITALSTREAM_EVENT_HUB_CONNECTION_STRING") {
        config.event_hub.connection_string = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("VITALSTREAM_EVENT_HUB_FULLY_QUALIFIED_NAMESPACE") {
        config.event_hub.fully_qualified_namespace = Some(val);
    }
    if let Ok(val) = std::env::var("VITALSTREAM_EVENT_HUB_NAME") {
        config.event_hub.event_hub_name = Some(val);
    }
    if let Ok(val) = std::env::var("VITALSTREAM_EVENT_HUB_CONSUMER_GROUP") {
        config.event_hub.consumer_group = val;
    }
    if let Some(secs) = env_parse("VITALSTREAM_EVENT_HUB_MAX_WAIT_SECONDS")? {
        config.event_hub.max_wait_seconds = secs;
    }

    // Batching overrides
    if let Some(secs) = env_parse("VITALSTREAM_BATCHING_FLUSH_TIMESPAN_SECONDS")? {
        config.batching.flush_timespan_seconds = secs;
    }
    if let Some(max) = env_parse("VITALSTREAM_BATCHING_MAX_EVENTS")? {
        config.batching.max_events = max;
    }

    // Consumer retry overrides
    if let Some(retries) = env_parse("VITALSTREAM_CONSUMER_RETRY_MAX_RETRIES")? {
        config.consumer.retry.max_retries = retries;
    }
    if let Some(ms) = env_parse("VITALSTREAM_CONSUMER_RETRY_INITIAL_DELAY_MS")? {
        config.consumer.retry.initial_delay_ms = ms;
    }
    if let Some(ms) = env_parse("VITALSTREAM_CONSUMER_RETRY_MAX_DELAY_MS")? {
        config.consumer.retry.max_delay_ms = ms;
    }

    // Checkpoint overrides
    if let Ok(val) = std::env::var("VITALSTREAM_CHECKPOINT_BLOB_PREFIX") {
        config.checkpoint.blob_prefix = val;
    }
    if let Some(freq) = env_parse("VITALSTREAM_CHECKPOINT_BATCH_FREQUENCY")? {
        config.checkpoint.batch_frequency = freq;
    }
    if let Ok(val) = std::env::var("VITALSTREAM_CHECKPOINT_STORE") {
        config.checkpoint.store = match val.to_lowercase().as_str() {
            "filesystem" => CheckpointStoreKind::Filesystem,
            "memory" => CheckpointStoreKind::Memory,
            other => {
                return Err(VitalStreamError::Configuration(format!(
                    "Invalid value for VITALSTREAM_CHECKPOINT_STORE: '{other}'"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("VITALSTREAM_CHECKPOINT_STORAGE_PATH") {
        config.checkpoint.storage_path = val;
    }

    // Logging overrides
    if let Some(enabled) = env_parse("VITALSTREAM_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("VITALSTREAM_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(json) = env_parse("VITALSTREAM_LOGGING_CONSOLE_JSON")? {
        config.logging.console_json = json;
    }

    Ok(())
}
