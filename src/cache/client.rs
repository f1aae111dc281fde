//! Cache client installer
//!
//! Configures a node to use every available and compatible cache server.

use crate::cache::assignment::CacheServers;
use crate::cache::installer::InstallerBase;
use crate::compute::types::NodeMetadata;
use crate::error::{FleetCacheError, FleetCacheResult};
use tracing::{info, warn};

/// Points client nodes at previously installed cache servers
pub struct CacheClientInstaller {
    base: InstallerBase,
}

impl CacheClientInstaller {
    pub fn new(base: InstallerBase) -> Self {
        Self { base }
    }

    /// Enable every compatible cache on `node`
    ///
    /// Strategies without a server in `servers` are skipped. Returns the
    /// names of the strategies that were enabled.
    pub async fn apply(
        &self,
        node: &NodeMetadata,
        servers: &CacheServers,
    ) -> FleetCacheResult<Vec<String>> {
        let script_family = node.script_family();
        let mut enabled = Vec::new();

        for strategy in self.base.client_compatible(node) {
            let Some(server) = servers.get(strategy.name()) else {
                warn!(
                    "No {} cache server installed, skipping node {}",
                    strategy.name(),
                    node.id
                );
                continue;
            };

            let address = server
                .first_private_address()
                .ok_or_else(|| FleetCacheError::MissingServerAddress(server.node_id.clone()))?;

            info!(
                "Enabling local {} cache on node: {} (server {})",
                strategy.name(),
                node.id,
                address
            );
            let script = strategy.client_configure_script(script_family, address)?;
            self.base.run_checked(node, &script).await?;
            enabled.push(strategy.name().to_string());
        }

        Ok(enabled)
    }
}
