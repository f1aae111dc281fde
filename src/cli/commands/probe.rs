//! Probe command - check that cache servers accept connections

use crate::cache::{strategy_by_name, CacheServers};
use crate::cli::args::ProbeArgs;
use crate::cli::commands::assignment_path;
use crate::config::Config;
use crate::error::{FleetCacheError, FleetCacheResult};
use crate::probe::wait_for_port;
use crate::ui::{self, UiContext};
use std::time::Duration;

/// Execute the probe command
pub async fn execute(args: ProbeArgs, config: &Config) -> FleetCacheResult<()> {
    let ctx = UiContext::detect();
    let servers = CacheServers::load(&assignment_path(config)).await?;

    ui::section(&ctx, "Cache server reachability");

    if servers.is_empty() {
        ui::step_warn_hint(&ctx, "No cache servers assigned", "Run: fleetcache server");
        return Ok(());
    }

    let mut unreachable = 0;
    for (name, record) in servers.iter() {
        let port = strategy_by_name(name)?.port();
        let Some(address) = record.probe_address() else {
            ui::step_error(&ctx, &format!("{}: server {} has no address", name, record.node_id));
            unreachable += 1;
            continue;
        };

        let target = format!("{}:{}", address, port);
        let open = wait_for_port(
            address,
            port,
            Duration::from_secs(args.wait),
            Duration::from_secs(args.interval.max(1)),
        )
        .await;

        if open {
            ui::step_ok_detail(&ctx, &format!("{} cache reachable", name), &target);
        } else {
            ui::step_error(&ctx, &format!("{} cache unreachable at {}", name, target));
            unreachable += 1;
        }
    }

    if unreachable > 0 {
        return Err(FleetCacheError::User(format!(
            "{} cache server(s) unreachable",
            unreachable
        )));
    }
    Ok(())
}
