//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for VitalStream using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// VitalStream - IoMT telemetry batching engine
#[derive(Parser, Debug)]
#[command(name = "vitalstream")]
#[command(version, about, long_about = None)]
#[command(author = "VitalStream Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "vitalstream.toml", env = "VITALSTREAM_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VITALSTREAM_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the batching engine from a JSON-lines event file
    Replay(commands::replay::ReplayArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// List stored partition checkpoints
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_replay() {
        let cli = Cli::parse_from(["vitalstream", "replay", "events.jsonl"]);
        assert_eq!(cli.config, "vitalstream.toml");
        match cli.command {
            Commands::Replay(args) => assert_eq!(args.input, "events.jsonl"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["vitalstream", "--config", "custom.toml", "status"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["vitalstream", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status_json() {
        let cli = Cli::parse_from(["vitalstream", "status", "--json"]);
        assert!(matches!(cli.command, Commands::Status(ref args) if args.json));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["vitalstream", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_replay_requires_input() {
        assert!(Cli::try_parse_from(["vitalstream", "replay"]).is_err());
    }
}
