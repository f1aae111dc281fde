//! fleetcache - shared package caches for provisioned fleets
//!
//! Installs a package-cache proxy (apt-cacher) on one node per OS family
//! and configures the rest of the fleet to download through it.

pub mod bootstrap;
pub mod cache;
pub mod cli;
pub mod compute;
pub mod config;
pub mod error;
pub mod probe;
pub mod ui;

pub use error::{FleetCacheError, FleetCacheResult};
