//! Render command - print a strategy's script without running it

use crate::cache::strategy_by_name;
use crate::cli::args::{RenderArgs, RenderKind};
use crate::error::FleetCacheResult;

/// Execute the render command
pub async fn execute(args: RenderArgs) -> FleetCacheResult<()> {
    let script = match args.kind {
        RenderKind::Server { strategy, family } => {
            strategy_by_name(&strategy)?.server_install_script(family.script_family())?
        }
        RenderKind::Client {
            strategy,
            family,
            address,
        } => strategy_by_name(&strategy)?
            .client_configure_script(family.script_family(), &address)?,
    };

    // Raw output so the script can be piped
    print!("{}", script);
    Ok(())
}
