//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "vitalstream.toml")]
    pub output: String,

    /// Include every section with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing VitalStream configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set VITALSTREAM_CONNECTION_STRING in your environment or a .env file");
                println!("  2. Validate configuration: vitalstream validate-config");
                println!("  3. Replay captured events: vitalstream replay events.jsonl");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# VitalStream Configuration File

[event_hub]
connection_string = "${VITALSTREAM_CONNECTION_STRING}"
consumer_group = "$Default"

[batching]
flush_timespan_seconds = 300
max_events = 500

[[consumer.outputs]]
name = "log"
type = "log"

[checkpoint]
blob_prefix = "vitalstream"
storage_path = "./checkpoints"
"#
        .to_string()
    }

    /// Generate configuration with every section documented
    fn generate_config_with_examples() -> String {
        r#"# VitalStream Configuration File
# Per-partition event batching and checkpointing for IoMT telemetry

[application]
log_level = "info"  # trace | debug | info | warn | error

[event_hub]
# Namespace and event hub name are read from Endpoint and EntityPath
connection_string = "${VITALSTREAM_CONNECTION_STRING}"
# Explicit values override the connection string
# fully_qualified_namespace = "telemetry.servicebus.windows.net"
# event_hub_name = "vitals"
consumer_group = "$Default"
# Idle seconds before a quiet partition is checked for an elapsed window
max_wait_seconds = 60

[batching]
# Window length; events are grouped by enqueued time
flush_timespan_seconds = 300
# Queue size that forces an immediate flush
max_events = 500

[consumer.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

[[consumer.outputs]]
name = "log"
type = "log"

[[consumer.outputs]]
name = "archive"
type = "jsonl"
path = "./output/events.jsonl"

[checkpoint]
# Checkpoints live under <blob_prefix>/checkpoint/<namespace>/<event hub>/<consumer group>/
blob_prefix = "vitalstream"
# One durable write per N flushes of a partition
batch_frequency = 1
store = "filesystem"  # filesystem | memory
storage_path = "./checkpoints"

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"  # daily | hourly | never
console_json = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use tempfile::TempDir;

    #[test]
    fn test_generated_configs_parse() {
        std::env::set_var(
            "VITALSTREAM_CONNECTION_STRING",
            "Endpoint=sb://ns.servicebus.windows.net/;SharedAccessKeyName=l;SharedAccessKey=k;EntityPath=vitals",
        );
        let minimal = load_config_from_str(&InitArgs::generate_minimal_config()).unwrap();
        let full = load_config_from_str(&InitArgs::generate_config_with_examples()).unwrap();

        assert_eq!(minimal.batching.max_events, 500);
        assert_eq!(full.consumer.outputs.len(), 2);
        assert_eq!(
            full.event_hub.source_identity().unwrap().entity(),
            "vitals"
        );
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("vitalstream.toml");
        std::fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_init_writes_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("vitalstream.toml");

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            with_examples: true,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_OK);
        assert!(std::fs::read_to_string(&output)
            .unwrap()
            .contains("[consumer.retry]"));
    }
}
