//! Compute backend factory
//!
//! Builds the backends commands run against from configuration.

use crate::compute::inventory::InventoryCompute;
use crate::compute::memory::MemoryCompute;
use crate::compute::service::ComputeService;
use crate::config::{Config, ConfigManager};
use crate::error::FleetCacheResult;
use std::path::PathBuf;

fn inventory_path(config: &Config) -> PathBuf {
    config
        .inventory
        .path
        .clone()
        .unwrap_or_else(ConfigManager::default_inventory_path)
}

/// Create the inventory-backed compute service for the current configuration
pub async fn create_compute(config: &Config) -> FleetCacheResult<InventoryCompute> {
    InventoryCompute::load(inventory_path(config), config.exec.clone()).await
}

/// Create an in-memory backend seeded from the inventory
///
/// Existing cache servers are still discovered, but nothing is created
/// or executed remotely, and the inventory file is never written.
pub async fn create_dry_run_compute(config: &Config) -> FleetCacheResult<MemoryCompute> {
    let inventory = create_compute(config).await?;
    Ok(MemoryCompute::with_nodes(inventory.list_nodes().await?))
}
