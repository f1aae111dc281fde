//! Inventory-backed compute service
//!
//! Implements the ComputeService trait over a JSON inventory file.
//! Scripts are piped to an operator-configured command (ssh by default)
//! and node creation is delegated to an optional provisioning command.

use crate::compute::service::ComputeService;
use crate::compute::types::{ExecResponse, NodeMetadata, Template};
use crate::config::schema::ExecConfig;
use crate::error::{FleetCacheError, FleetCacheResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Compute service over a static node inventory
pub struct InventoryCompute {
    path: PathBuf,
    exec: ExecConfig,
    nodes: Mutex<Vec<NodeMetadata>>,
}

impl InventoryCompute {
    /// Load the inventory at `path`; a missing file is an empty inventory
    pub async fn load(path: PathBuf, exec: ExecConfig) -> FleetCacheResult<Self> {
        let nodes = if path.exists() {
            Self::read_nodes(&path).await?
        } else {
            debug!("Inventory {} not found, starting empty", path.display());
            Vec::new()
        };

        Ok(Self {
            path,
            exec,
            nodes: Mutex::new(nodes),
        })
    }

    async fn read_nodes(path: &Path) -> FleetCacheResult<Vec<NodeMetadata>> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FleetCacheError::io(format!("reading inventory {}", path.display()), e))?;

        serde_json::from_str(&content).map_err(|e| FleetCacheError::InventoryRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, nodes: &[NodeMetadata]) -> FleetCacheResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                FleetCacheError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        let content = serde_json::to_string_pretty(nodes)?;
        fs::write(&self.path, content).await.map_err(|e| {
            FleetCacheError::io(format!("writing inventory {}", self.path.display()), e)
        })
    }

    /// Look up a node by id
    pub async fn node(&self, node_id: &str) -> FleetCacheResult<NodeMetadata> {
        self.nodes
            .lock()
            .await
            .iter()
            .find(|n| n.id == node_id)
            .cloned()
            .ok_or_else(|| FleetCacheError::NodeNotFound(node_id.to_string()))
    }
}

/// Substitute `{key}` placeholders in every argument
pub(crate) fn expand_argv(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (key, value)| {
                acc.replace(&format!("{{{}}}", key), value)
            })
        })
        .collect()
}

#[async_trait]
impl ComputeService for InventoryCompute {
    async fn list_nodes(&self) -> FleetCacheResult<Vec<NodeMetadata>> {
        Ok(self.nodes.lock().await.clone())
    }

    async fn create_nodes_in_group(
        &self,
        group: &str,
        count: usize,
        template: &Template,
    ) -> FleetCacheResult<Vec<NodeMetadata>> {
        let provision = self
            .exec
            .provision_command
            .as_ref()
            .ok_or(FleetCacheError::ProvisioningUnavailable)?;

        let count_arg = count.to_string();
        let argv = expand_argv(
            provision,
            &[
                ("group", group),
                ("count", &count_arg),
                ("image", &template.image.id),
                ("hardware", template.hardware.as_deref().unwrap_or("")),
                ("location", template.location.as_deref().unwrap_or("")),
            ],
        );
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| FleetCacheError::User("exec.provision_command is empty".to_string()))?;

        info!("Provisioning {} node(s) in group {}", count, group);
        debug!("Executing: {} {:?}", program, args);

        let output = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| FleetCacheError::command_failed(program.clone(), e))?;

        if !output.status.success() {
            return Err(FleetCacheError::NodeCreation {
                group: group.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut created: Vec<NodeMetadata> =
            serde_json::from_slice(&output.stdout).map_err(|e| FleetCacheError::NodeCreation {
                group: group.to_string(),
                reason: format!("provision_command printed invalid node JSON: {}", e),
            })?;

        for node in &mut created {
            if node.group.is_none() {
                node.group = Some(group.to_string());
            }
            if node.operating_system.is_none() {
                node.operating_system = template.image.operating_system.clone();
            }
        }

        let mut nodes = self.nodes.lock().await;
        nodes.extend(created.iter().cloned());
        self.save(&nodes).await?;

        Ok(created)
    }

    async fn run_script(&self, node_id: &str, script: &str) -> FleetCacheResult<ExecResponse> {
        let node = self.node(node_id).await?;
        let host = node
            .reachable_address()
            .ok_or_else(|| FleetCacheError::NodeUnreachable(node_id.to_string()))?;

        let argv = expand_argv(&self.exec.run_command, &[("host", host), ("node", &node.id)]);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| FleetCacheError::User("exec.run_command is empty".to_string()))?;

        debug!("Executing on {}: {} {:?}", node.id, program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FleetCacheError::command_failed(program.clone(), e))?;

        // A command that exits without reading stdin closes the pipe early;
        // its exit status and stderr are reported below.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(script.as_bytes()).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("{} closed stdin before reading the whole script", node.id);
                }
                Err(e) => {
                    return Err(FleetCacheError::io(
                        format!("sending script to {}", node.id),
                        e,
                    ))
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| FleetCacheError::command_failed(program.clone(), e))?;

        Ok(ExecResponse {
            exit_status: output.status.code().unwrap_or(-1),
            output: String::from_utf8_lossy(&output.stdout).to_string(),
            error: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "Inventory"
    }
}
