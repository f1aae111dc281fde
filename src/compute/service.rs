//! Compute service abstraction
//!
//! The provisioning collaborator fleetcache relies on. Backends list
//! nodes, create nodes in a named group and run shell scripts on a node.

use crate::compute::types::{ExecResponse, NodeMetadata, Template};
use crate::error::FleetCacheResult;
use async_trait::async_trait;

/// Abstract compute service interface
#[async_trait]
pub trait ComputeService: Send + Sync {
    /// List every node known to the backend
    async fn list_nodes(&self) -> FleetCacheResult<Vec<NodeMetadata>>;

    /// List nodes accepted by `predicate`
    async fn list_nodes_matching(
        &self,
        predicate: &(dyn for<'n> Fn(&'n NodeMetadata) -> bool + Sync),
    ) -> FleetCacheResult<Vec<NodeMetadata>> {
        let nodes = self.list_nodes().await?;
        Ok(nodes.into_iter().filter(|n| predicate(n)).collect())
    }

    /// Create `count` nodes in `group` from `template`
    async fn create_nodes_in_group(
        &self,
        group: &str,
        count: usize,
        template: &Template,
    ) -> FleetCacheResult<Vec<NodeMetadata>>;

    /// Run a shell script on a node and report its exit status
    async fn run_script(&self, node_id: &str, script: &str) -> FleetCacheResult<ExecResponse>;

    /// Get the human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}
