//! Server command - find or create the cache server and install caches

use crate::bootstrap::AdminAccess;
use crate::cache::{CacheServerInstaller, CacheServers};
use crate::cli::args::ServerArgs;
use crate::cli::commands::{assignment_path, Backend};
use crate::config::Config;
use crate::error::FleetCacheResult;
use crate::ui::{self, TaskSpinner, UiContext};
use console::style;
use tracing::debug;

/// Execute the server command
pub async fn execute(args: ServerArgs, config: &Config) -> FleetCacheResult<()> {
    let ctx = UiContext::detect();
    let template = config.server.template.to_template()?;
    let backend = Backend::open(config, args.dry_run).await?;

    let mut installer =
        CacheServerInstaller::new(backend.installer_base(config)?, &config.server.group_prefix);
    if config.admin.enabled && !args.no_bootstrap {
        let access = AdminAccess::from_config(&config.admin).await?;
        debug!("Admin bootstrap prepared for user {}", access.user);
        installer = installer.with_bootstrap(access.render());
    }

    let family = template.image.os_family();
    ui::section(&ctx, "Cache server");
    ui::key_value(&ctx, "Backend", backend.compute.backend_name());
    ui::key_value(&ctx, "Image", &template.image.name);
    ui::key_value(&ctx, "Group", &installer.group_for(family));

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Installing cache servers for {}", family));

    let result = match installer.apply(&template).await {
        Ok(result) => result,
        Err(e) => {
            spinner.stop_error("Cache server installation failed");
            return Err(e);
        }
    };

    let verb = if result.server.created { "Created" } else { "Reused" };
    spinner.stop(&format!(
        "{} cache server {}",
        verb,
        style(&result.server.node.id).cyan()
    ));

    if result.installed.is_empty() {
        ui::step_warn_hint(
            &ctx,
            &format!("No enabled strategy supports {}", family),
            "Run: fleetcache strategies",
        );
    }
    for (strategy, record) in result.installed.iter() {
        ui::step_ok_detail(
            &ctx,
            &format!("{} cache installed", strategy),
            record.first_private_address().unwrap_or("no private address"),
        );
    }

    if args.dry_run {
        backend.report_dry_run(&ctx);
        return Ok(());
    }

    let path = assignment_path(config);
    let mut servers = CacheServers::load_or_default(&path).await?;
    servers.merge(result.installed);
    servers.save(&path).await?;
    debug!("Saved cache server assignments to {}", path.display());

    Ok(())
}
