//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the VitalStream configuration file.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::config::{load_config, redact_connection_string, OutputKind};
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let identity = match config.event_hub.source_identity() {
            Ok(identity) => identity,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        if let Some(conn) = &config.event_hub.connection_string {
            println!(
                "  Connection String: {}",
                redact_connection_string(conn.expose_secret().as_ref())
            );
        }
        println!("  Namespace: {}", identity.namespace());
        println!("  Event Hub: {}", identity.entity());
        println!("  Consumer Group: {}", identity.consumer_group());
        println!("  Max Wait: {}s", config.event_hub.max_wait_seconds);
        println!(
            "  Window: {}s, Max Events: {}",
            config.batching.flush_timespan_seconds, config.batching.max_events
        );
        println!(
            "  Retries: {} (initial {}ms, max {}ms)",
            config.consumer.retry.max_retries,
            config.consumer.retry.initial_delay_ms,
            config.consumer.retry.max_delay_ms
        );
        for output in &config.consumer.outputs {
            match output.kind {
                OutputKind::Log => println!("  Consumer: {} (log)", output.name),
                OutputKind::Jsonl => println!(
                    "  Consumer: {} (jsonl → {})",
                    output.name,
                    output.path.as_deref().unwrap_or("-")
                ),
            }
        }
        println!(
            "  Checkpoints: {:?} store, prefix '{}', every {} flush(es)",
            config.checkpoint.store, config.checkpoint.blob_prefix, config.checkpoint.batch_frequency
        );
        println!();
        Ok(EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_missing_file_returns_config_exit() {
        let code = ValidateArgs {}.execute("does-not-exist.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }

    #[tokio::test]
    async fn test_validate_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[event_hub]\nfully_qualified_namespace = \"ns.servicebus.windows.net\"\nevent_hub_name = \"vitals\""
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
    }
}
