//! CLI command implementations

pub mod client;
pub mod config;
pub mod probe;
pub mod render;
pub mod server;
pub mod strategies;

pub use client::execute as client;
pub use config::execute as config;
pub use probe::execute as probe;
pub use render::execute as render;
pub use server::execute as server;
pub use strategies::execute as strategies;

use crate::cache::{strategies_from_names, InstallerBase};
use crate::compute::{create_compute, create_dry_run_compute, ComputeService, MemoryCompute};
use crate::config::{Config, ConfigManager};
use crate::error::FleetCacheResult;
use crate::ui::{self, UiContext};
use std::path::PathBuf;
use std::sync::Arc;

/// Compute backend for a command, plus the recorder when dry-running
pub(crate) struct Backend {
    pub compute: Arc<dyn ComputeService>,
    pub recorder: Option<Arc<MemoryCompute>>,
}

impl Backend {
    pub async fn open(config: &Config, dry_run: bool) -> FleetCacheResult<Self> {
        if dry_run {
            let memory = Arc::new(create_dry_run_compute(config).await?);
            Ok(Self {
                compute: memory.clone(),
                recorder: Some(memory),
            })
        } else {
            Ok(Self {
                compute: Arc::new(create_compute(config).await?),
                recorder: None,
            })
        }
    }

    /// Installer base over this backend with the configured strategies
    pub fn installer_base(&self, config: &Config) -> FleetCacheResult<InstallerBase> {
        let strategies = strategies_from_names(&config.strategies.enabled)?;
        Ok(InstallerBase::new(self.compute.clone(), strategies).with_timeout(config.exec.timeout()))
    }

    /// Print what a dry run would have done
    pub fn report_dry_run(&self, ctx: &UiContext) {
        let Some(recorder) = &self.recorder else {
            return;
        };

        for node in recorder.created() {
            ui::step_info(
                ctx,
                &format!(
                    "Would create node {} in group {}",
                    node.id,
                    node.group.as_deref().unwrap_or("-")
                ),
            );
        }
        for recorded in recorder.scripts() {
            ui::section(ctx, &format!("Script for {}", recorded.node_id));
            print!("{}", recorded.script);
        }
    }
}

/// Location of the persisted cache server assignments
pub(crate) fn assignment_path(config: &Config) -> PathBuf {
    config
        .inventory
        .assignment_path
        .clone()
        .unwrap_or_else(ConfigManager::default_assignment_path)
}
