//! CLI argument definitions using clap derive

use crate::compute::types::OsFamily;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// fleetcache - shared package caches for provisioned fleets
///
/// Boots or reuses one package-cache proxy per OS family and points
/// the other nodes of the fleet at it.
#[derive(Parser, Debug)]
#[command(name = "fleetcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FLEETCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find or create the cache server and install compatible caches on it
    Server(ServerArgs),

    /// Configure nodes to use the installed cache servers
    Client(ClientArgs),

    /// Print the script a strategy renders
    Render(RenderArgs),

    /// List enabled cache strategies
    Strategies,

    /// Check that assigned cache servers accept connections
    Probe(ProbeArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the server command
#[derive(Parser, Debug)]
pub struct ServerArgs {
    /// Record scripts instead of running them; nothing is created or saved
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the admin access bootstrap on newly created servers
    #[arg(long)]
    pub no_bootstrap: bool,
}

/// Arguments for the client command
#[derive(Parser, Debug)]
pub struct ClientArgs {
    /// Inventory node IDs to configure
    #[arg(required = true)]
    pub nodes: Vec<String>,

    /// Record scripts instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Which script to render
    #[command(subcommand)]
    pub kind: RenderKind,
}

/// Render subcommands
#[derive(Subcommand, Debug)]
pub enum RenderKind {
    /// Server install script
    Server {
        /// Strategy name
        #[arg(short, long, default_value = "apt")]
        strategy: String,

        /// OS family of the server
        #[arg(short, long, default_value = "ubuntu", value_parser = parse_family)]
        family: OsFamily,
    },

    /// Client configure script
    Client {
        /// Strategy name
        #[arg(short, long, default_value = "apt")]
        strategy: String,

        /// OS family of the client
        #[arg(short, long, default_value = "ubuntu", value_parser = parse_family)]
        family: OsFamily,

        /// Cache server address clients are routed to
        #[arg(short, long)]
        address: String,
    },
}

/// Arguments for the probe command
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Keep retrying for this many seconds
    #[arg(short, long, default_value = "0")]
    pub wait: u64,

    /// Seconds between attempts
    #[arg(long, default_value = "5")]
    pub interval: u64,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Parse an OS family name
fn parse_family(s: &str) -> Result<OsFamily, String> {
    s.parse().map_err(|e: crate::error::FleetCacheError| e.to_string())
}
