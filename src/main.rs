// VitalStream - IoMT telemetry event batching engine
// Copyright (c) 2025 VitalStream Contributors
// Licensed under the MIT License

use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;
use vitalstream::cli::commands::EXIT_FATAL;
use vitalstream::cli::{Cli, Commands};
use vitalstream::config::{load_config, LoggingConfig};
use vitalstream::logging::{init_logging, LoggingGuard};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "VitalStream - IoMT telemetry batching engine"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown(shutdown.clone()));

    let exit_code = match execute_command(&cli, shutdown).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    // Flush buffered file logs before exiting
    drop(guard);
    process::exit(exit_code);
}

/// Console logging for every command; replay also gets the configured file sink
fn setup_logging(cli: &Cli) -> vitalstream::domain::Result<LoggingGuard> {
    let console_only = LoggingConfig {
        local_enabled: false,
        ..LoggingConfig::default()
    };

    if let Commands::Replay(_) = cli.command {
        if let Ok(config) = load_config(&cli.config) {
            let level = cli
                .log_level
                .clone()
                .unwrap_or_else(|| config.application.log_level.clone());
            return init_logging(&level, &config.logging);
        }
    }

    let level = cli.log_level.as_deref().unwrap_or("info");
    init_logging(level, &console_only)
}

async fn wait_for_shutdown(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
    }

    println!("\n⚠️  Shutdown signal received, stopping partition pumps...");
    shutdown.cancel();
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown: CancellationToken) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Replay(args) => args.execute(&cli.config, shutdown).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
