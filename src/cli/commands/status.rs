//! Status command implementation
//!
//! This module implements the `status` command for listing the stored
//! checkpoint of every partition.

use super::{EXIT_CONFIG, EXIT_OK, EXIT_STORAGE};
use crate::config::{load_config, CheckpointStoreKind};
use crate::core::checkpoint::CheckpointClient;
use crate::host::checkpoint_client;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show this partition
    #[arg(long)]
    pub partition_id: Option<String>,

    /// Print checkpoints as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking checkpoint status");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if config.checkpoint.store == CheckpointStoreKind::Memory {
            println!("Checkpoints use the in-memory store; nothing is persisted between runs.");
            return Ok(EXIT_OK);
        }

        let client = match checkpoint_client(&config) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Invalid checkpoint configuration");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let checkpoints = match client.list_checkpoints().await {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to read checkpoints");
                println!("   Error: {e}");
                return Ok(EXIT_STORAGE);
            }
        };

        let filtered: Vec<_> = checkpoints
            .iter()
            .filter(|c| {
                self.partition_id
                    .as_deref()
                    .map_or(true, |pid| c.partition_id.as_str() == pid)
            })
            .collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&filtered)?);
            return Ok(EXIT_OK);
        }

        println!("📊 Checkpoint Status");
        println!("   Source: {}", client.paths().identity());
        println!("   Location: {}", client.paths().consumer_group_prefix());
        println!();

        if filtered.is_empty() {
            println!("No checkpoints found.");
            println!("Run 'vitalstream replay <file>' to process events.");
            return Ok(EXIT_OK);
        }

        println!(
            "{:<12} {:<16} {:<20} {:<8} {:<38}",
            "Partition", "Sequence", "Offset", "Epoch", "Owner"
        );
        println!("{}", "-".repeat(96));

        for checkpoint in filtered {
            println!(
                "{:<12} {:<16} {:<20} {:<8} {:<38}",
                checkpoint.partition_id.as_str(),
                checkpoint.sequence_number,
                checkpoint.offset,
                checkpoint.epoch,
                checkpoint.owner
            );
        }

        println!();
        Ok(EXIT_OK)
    }
}
