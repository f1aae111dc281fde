//! In-memory compute service
//!
//! Keeps nodes in process memory and records every script instead of
//! executing it. Backs `--dry-run` and the coordinator tests.

use crate::compute::service::ComputeService;
use crate::compute::types::{ExecResponse, NodeMetadata, Template};
use crate::error::{FleetCacheError, FleetCacheResult};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::debug;

/// A script handed to the in-memory backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedScript {
    pub node_id: String,
    pub script: String,
}

#[derive(Debug, Default)]
struct State {
    nodes: Vec<NodeMetadata>,
    created: Vec<NodeMetadata>,
    scripts: Vec<RecordedScript>,
}

/// Compute service that only records what it is asked to do
#[derive(Debug, Default)]
pub struct MemoryCompute {
    state: Mutex<State>,
    exit_status: i32,
}

impl MemoryCompute {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend seeded with existing nodes
    pub fn with_nodes(nodes: Vec<NodeMetadata>) -> Self {
        Self {
            state: Mutex::new(State {
                nodes,
                ..State::default()
            }),
            exit_status: 0,
        }
    }

    /// Report `status` as the exit status of every script
    pub fn exiting_with(mut self, status: i32) -> Self {
        self.exit_status = status;
        self
    }

    /// Nodes created through this backend, in creation order
    pub fn created(&self) -> Vec<NodeMetadata> {
        self.state
            .lock()
            .expect("memory compute state poisoned")
            .created
            .clone()
    }

    /// Scripts submitted to this backend, in submission order
    pub fn scripts(&self) -> Vec<RecordedScript> {
        self.state
            .lock()
            .expect("memory compute state poisoned")
            .scripts
            .clone()
    }

    fn lock(&self) -> FleetCacheResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| FleetCacheError::Internal("memory compute state poisoned".to_string()))
    }
}

#[async_trait]
impl ComputeService for MemoryCompute {
    async fn list_nodes(&self) -> FleetCacheResult<Vec<NodeMetadata>> {
        Ok(self.lock()?.nodes.clone())
    }

    async fn create_nodes_in_group(
        &self,
        group: &str,
        count: usize,
        template: &Template,
    ) -> FleetCacheResult<Vec<NodeMetadata>> {
        let mut state = self.lock()?;
        let mut created = Vec::with_capacity(count);

        for _ in 0..count {
            let index = state.nodes.len() + 1;
            let node = NodeMetadata {
                id: format!("{}-{}", group, index),
                name: format!("{}-{}", group, index),
                hostname: None,
                group: Some(group.to_string()),
                operating_system: template.image.operating_system.clone(),
                private_addresses: vec![format!("10.0.0.{}", index)],
                public_addresses: vec![],
            };
            debug!("Recorded node creation: {}", node.id);
            state.nodes.push(node.clone());
            state.created.push(node.clone());
            created.push(node);
        }

        Ok(created)
    }

    async fn run_script(&self, node_id: &str, script: &str) -> FleetCacheResult<ExecResponse> {
        let mut state = self.lock()?;
        if !state.nodes.iter().any(|n| n.id == node_id) {
            return Err(FleetCacheError::NodeNotFound(node_id.to_string()));
        }

        state.scripts.push(RecordedScript {
            node_id: node_id.to_string(),
            script: script.to_string(),
        });

        Ok(ExecResponse {
            exit_status: self.exit_status,
            ..ExecResponse::default()
        })
    }

    fn backend_name(&self) -> &'static str {
        "In-memory"
    }
}
