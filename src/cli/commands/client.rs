//! Client command - point nodes at the installed cache servers

use crate::cache::{CacheClientInstaller, CacheServers};
use crate::cli::args::ClientArgs;
use crate::cli::commands::{assignment_path, Backend};
use crate::config::Config;
use crate::error::{FleetCacheError, FleetCacheResult};
use crate::ui::{self, TaskSpinner, UiContext};
use console::style;

/// Execute the client command
pub async fn execute(args: ClientArgs, config: &Config) -> FleetCacheResult<()> {
    let ctx = UiContext::detect();
    let servers = CacheServers::load(&assignment_path(config)).await?;
    let backend = Backend::open(config, args.dry_run).await?;
    let installer = CacheClientInstaller::new(backend.installer_base(config)?);

    let nodes = backend.compute.list_nodes().await?;
    let targets = args
        .nodes
        .iter()
        .map(|id| {
            nodes
                .iter()
                .find(|n| &n.id == id)
                .ok_or_else(|| FleetCacheError::NodeNotFound(id.clone()))
        })
        .collect::<FleetCacheResult<Vec<_>>>()?;

    ui::section(&ctx, "Cache clients");

    for node in targets {
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start(&format!("Configuring {}", node.id));

        match installer.apply(node, &servers).await {
            Ok(enabled) if enabled.is_empty() => {
                spinner.stop(&format!("{}: no compatible cache server", style(&node.id).cyan()));
            }
            Ok(enabled) => {
                spinner.stop(&format!(
                    "{}: enabled {}",
                    style(&node.id).cyan(),
                    enabled.join(", ")
                ));
            }
            Err(e) => {
                spinner.stop_error(&format!("{}: configuration failed", node.id));
                return Err(e);
            }
        }
    }

    backend.report_dry_run(&ctx);
    Ok(())
}
