//! Strategies command - list enabled cache strategies

use crate::cache::{strategies_from_names, AVAILABLE_STRATEGIES};
use crate::config::Config;
use crate::error::FleetCacheResult;
use console::style;

/// Execute the strategies command
pub async fn execute(config: &Config) -> FleetCacheResult<()> {
    let strategies = strategies_from_names(&config.strategies.enabled)?;

    println!("{:<10} {:<6} {:<20}", "STRATEGY", "PORT", "FAMILIES");
    println!("{}", "-".repeat(36));

    for strategy in &strategies {
        let families: Vec<&str> = strategy
            .supported_families()
            .iter()
            .map(|f| f.as_str())
            .collect();
        println!(
            "{:<10} {:<6} {:<20}",
            style(strategy.name()).cyan(),
            strategy.port(),
            families.join(", ")
        );
    }

    println!();
    println!(
        "Enabled: {} of {} available",
        strategies.len(),
        AVAILABLE_STRATEGIES.len()
    );
    Ok(())
}
