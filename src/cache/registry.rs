//! Strategy registry
//!
//! Resolves the strategy names listed in configuration into the
//! strategy set handed to the installers.

use crate::cache::apt::AptCache;
use crate::cache::strategy::CacheStrategy;
use crate::error::{FleetCacheError, FleetCacheResult};
use std::sync::Arc;

/// Names of every built-in strategy
pub const AVAILABLE_STRATEGIES: &[&str] = &["apt"];

/// Look up a built-in strategy by name (case-insensitive)
pub fn strategy_by_name(name: &str) -> FleetCacheResult<Arc<dyn CacheStrategy>> {
    match name.trim().to_lowercase().as_str() {
        "apt" | "apt-cacher" => Ok(Arc::new(AptCache::new())),
        _ => Err(FleetCacheError::UnknownStrategy(name.to_string())),
    }
}

/// Resolve configured names, keeping first-seen order and dropping duplicates
pub fn strategies_from_names(names: &[String]) -> FleetCacheResult<Vec<Arc<dyn CacheStrategy>>> {
    let mut strategies: Vec<Arc<dyn CacheStrategy>> = Vec::with_capacity(names.len());
    for name in names {
        let strategy = strategy_by_name(name)?;
        if strategies.iter().all(|s| s.name() != strategy.name()) {
            strategies.push(strategy);
        }
    }
    Ok(strategies)
}
