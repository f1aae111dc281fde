//! Shared installer plumbing
//!
//! Compatibility filtering over the configured strategies and the
//! checked script primitive: every script must finish within the
//! timeout with exit status zero.

use crate::cache::strategy::CacheStrategy;
use crate::compute::ComputeService;
use crate::compute::types::{ExecResponse, Image, NodeMetadata};
use crate::error::{FleetCacheError, FleetCacheResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default per-script completion timeout
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Strategy set plus compute handle shared by both installers
#[derive(Clone)]
pub struct InstallerBase {
    compute: Arc<dyn ComputeService>,
    strategies: Vec<Arc<dyn CacheStrategy>>,
    timeout: Duration,
}

impl InstallerBase {
    pub fn new(compute: Arc<dyn ComputeService>, strategies: Vec<Arc<dyn CacheStrategy>>) -> Self {
        Self {
            compute,
            strategies,
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }

    /// Override the per-script timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn compute(&self) -> &dyn ComputeService {
        &*self.compute
    }

    /// Strategies whose server can run on `image`
    pub fn server_compatible<'a>(
        &'a self,
        image: &'a Image,
    ) -> impl Iterator<Item = &'a Arc<dyn CacheStrategy>> + 'a {
        self.strategies
            .iter()
            .filter(move |s| s.is_server_compatible(image))
    }

    /// Strategies that can configure `node` as a client
    pub fn client_compatible<'a>(
        &'a self,
        node: &'a NodeMetadata,
    ) -> impl Iterator<Item = &'a Arc<dyn CacheStrategy>> + 'a {
        self.strategies
            .iter()
            .filter(move |s| s.is_client_compatible(node))
    }

    /// Run `script` on `node`, failing on timeout or nonzero exit status
    pub async fn run_checked(
        &self,
        node: &NodeMetadata,
        script: &str,
    ) -> FleetCacheResult<ExecResponse> {
        debug!("Running script on {}:\n{}", node.id, script);

        let response = tokio::time::timeout(self.timeout, self.compute.run_script(&node.id, script))
            .await
            .map_err(|_| FleetCacheError::ScriptTimeout {
                node: node.id.clone(),
                timeout: self.timeout,
            })??;

        if !response.success() {
            return Err(FleetCacheError::ScriptFailed {
                node: node.id.clone(),
                exit_status: response.exit_status,
                stderr: response.error,
            });
        }

        Ok(response)
    }
}
