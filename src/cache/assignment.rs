//! Cache server assignments
//!
//! The server installer returns which node serves each strategy; the
//! client installer consumes it. Persisted as JSON between CLI runs.

use crate::compute::types::NodeMetadata;
use crate::error::{FleetCacheError, FleetCacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// The node selected or created to run cache servers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheServerRecord {
    pub node_id: String,
    /// `<prefix>-<os family>`
    pub group: String,
    #[serde(default)]
    pub private_addresses: Vec<String>,
    #[serde(default)]
    pub public_addresses: Vec<String>,
    pub resolved_at: DateTime<Utc>,
}

impl CacheServerRecord {
    pub fn from_node(node: &NodeMetadata, group: &str) -> Self {
        Self {
            node_id: node.id.clone(),
            group: group.to_string(),
            private_addresses: node.private_addresses.clone(),
            public_addresses: node.public_addresses.clone(),
            resolved_at: Utc::now(),
        }
    }

    /// Address clients are routed to
    pub fn first_private_address(&self) -> Option<&str> {
        self.private_addresses.first().map(String::as_str)
    }

    /// Address the operator's machine can probe
    pub fn probe_address(&self) -> Option<&str> {
        self.public_addresses
            .first()
            .or_else(|| self.private_addresses.first())
            .map(String::as_str)
    }
}

/// Mapping from strategy name to the server hosting it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheServers {
    servers: BTreeMap<String, CacheServerRecord>,
}

impl CacheServers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, strategy: impl Into<String>, record: CacheServerRecord) {
        self.servers.insert(strategy.into(), record);
    }

    pub fn get(&self, strategy: &str) -> Option<&CacheServerRecord> {
        self.servers.get(strategy)
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheServerRecord)> {
        self.servers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay `other`; its entries replace existing ones per strategy
    pub fn merge(&mut self, other: CacheServers) {
        self.servers.extend(other.servers);
    }

    /// Load assignments from `path`
    pub async fn load(path: &Path) -> FleetCacheResult<Self> {
        if !path.exists() {
            return Err(FleetCacheError::AssignmentNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            FleetCacheError::io(format!("reading assignments from {}", path.display()), e)
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load assignments, treating a missing file as empty
    pub async fn load_or_default(path: &Path) -> FleetCacheResult<Self> {
        match Self::load(path).await {
            Err(FleetCacheError::AssignmentNotFound(_)) => {
                debug!("No assignments at {}, starting empty", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save assignments to `path`
    pub async fn save(&self, path: &Path) -> FleetCacheResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                FleetCacheError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            FleetCacheError::io(format!("writing assignments to {}", path.display()), e)
        })
    }
}
