//! Error types for fleetcache
//!
//! All modules use `FleetCacheResult<T>` as their return type.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for fleetcache operations
pub type FleetCacheResult<T> = Result<T, FleetCacheError>;

/// All errors that can occur in fleetcache
#[derive(Error, Debug)]
pub enum FleetCacheError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown cache strategy: {0}")]
    UnknownStrategy(String),

    #[error("Unknown OS family: {0}")]
    UnknownOsFamily(String),

    // Compute errors
    #[error("Node not found in inventory: {0}")]
    NodeNotFound(String),

    #[error("Node {0} has no reachable address")]
    NodeUnreachable(String),

    #[error("Provisioning unavailable: no provision_command configured")]
    ProvisioningUnavailable,

    #[error("Failed to create node in group {group}: {reason}")]
    NodeCreation { group: String, reason: String },

    #[error("Failed to read inventory {path}: {reason}")]
    InventoryRead { path: PathBuf, reason: String },

    // Script errors
    #[error("{strategy} cache does not support {family} scripts")]
    UnsupportedScriptFamily { strategy: String, family: String },

    #[error("Script failed on node {node}, exit status: {exit_status}")]
    ScriptFailed {
        node: String,
        exit_status: i32,
        stderr: String,
    },

    #[error("Script on node {node} did not complete within {}s", .timeout.as_secs())]
    ScriptTimeout { node: String, timeout: Duration },

    // Cache server errors
    #[error("Found {count} cache servers in group {group}, expected at most one")]
    MultipleCacheServers { group: String, count: usize },

    #[error("Cache server {0} has no private address")]
    MissingServerAddress(String),

    #[error("No cache server assignment found at {0}")]
    AssignmentNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl FleetCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MultipleCacheServers { .. } => {
                Some("Remove the duplicate cache server nodes so only one remains per OS family")
            }
            Self::ProvisioningUnavailable => {
                Some("Set exec.provision_command, or add the server node to the inventory")
            }
            Self::AssignmentNotFound(_) => Some("Run: fleetcache server"),
            Self::UnknownStrategy(_) => Some("Run: fleetcache strategies"),
            Self::ScriptTimeout { .. } => Some("Raise exec.timeout_secs in the configuration"),
            _ => None,
        }
    }
}
