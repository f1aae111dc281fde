//! fleetcache - shared package caches for provisioned fleets
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use fleetcache::cli::{Cli, Commands};
use fleetcache::config::ConfigManager;
use fleetcache::error::FleetCacheResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> FleetCacheResult<()> {
    let cli = Cli::parse();

    // Render output must stay pipeable, so it skips config and logging setup
    if let Commands::Render(args) = cli.command {
        return fleetcache::cli::commands::render(args).await;
    }

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("fleetcache=warn"),
        1 => EnvFilter::new("fleetcache=info"),
        _ => EnvFilter::new("fleetcache=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time();
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Render(_) => unreachable!("Render handled above"),
        Commands::Server(args) => fleetcache::cli::commands::server(args, &config).await,
        Commands::Client(args) => fleetcache::cli::commands::client(args, &config).await,
        Commands::Strategies => fleetcache::cli::commands::strategies(&config).await,
        Commands::Probe(args) => fleetcache::cli::commands::probe(args, &config).await,
        Commands::Config(args) => {
            fleetcache::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
