//! Replay command implementation
//!
//! Runs a JSON-lines event file through the batching engine using the
//! configured consumers and checkpoint store.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK, EXIT_STORAGE};
use crate::config::load_config;
use crate::domain::{CheckpointError, VitalStreamError};
use crate::host::Engine;
use clap::Args;
use tokio_util::sync::CancellationToken;

/// Arguments for the replay command
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file with one event record per line
    pub input: String,

    /// Print the per-partition report as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReplayArgs {
    /// Execute the replay command
    pub async fn execute(&self, config_path: &str, cancel: CancellationToken) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, input = %self.input, "Starting replay");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let engine = match Engine::from_config(&config) {
            Ok(engine) => engine,
            Err(e) => {
                println!("❌ Invalid configuration");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let report = match engine.replay_source().replay_file(&self.input, &cancel).await {
            Ok(report) => report,
            Err(VitalStreamError::Cancelled) => {
                println!("⚠️  Replay cancelled");
                return Ok(EXIT_FATAL);
            }
            Err(e) => {
                println!("❌ Replay failed");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(EXIT_OK);
        }

        println!("✅ Replay complete");
        println!();
        println!(
            "{:<12} {:<10} {:<10} {:<10} {:<10}",
            "Partition", "Events", "Flushed", "Buffered", "Skipped"
        );
        println!("{}", "-".repeat(56));
        for partition in &report.partitions {
            println!(
                "{:<12} {:<10} {:<10} {:<10} {:<10}",
                partition.partition_id.as_str(),
                partition.events,
                partition.flushed(),
                partition.buffered,
                partition.skipped
            );
        }
        println!();
        if report.total_buffered() > 0 {
            println!(
                "{} event(s) were still inside an open window and were not checkpointed.",
                report.total_buffered()
            );
        }

        let metrics = engine.batching.metrics();
        tracing::info!(metrics = ?metrics, "Batching counters");
        Ok(EXIT_OK)
    }
}

fn exit_code_for(error: &VitalStreamError) -> i32 {
    match error {
        VitalStreamError::Configuration(_) => EXIT_CONFIG,
        VitalStreamError::Storage(_)
        | VitalStreamError::Checkpoint(
            CheckpointError::ReadFailed(_) | CheckpointError::DeleteFailed { .. },
        ) => EXIT_STORAGE,
        _ => EXIT_FATAL,
    }
}
