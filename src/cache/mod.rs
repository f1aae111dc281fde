//! Package repository cache installation
//!
//! Strategies describe one kind of package cache each (apt, ...). The
//! server installer finds or boots one cache server per OS family and
//! installs every compatible strategy on it; the client installer then
//! points nodes at those servers.
//!
//! # Flow
//!
//! ```text
//! Template ──> CacheServerInstaller::apply ──> CacheServers
//!                                                   │
//! NodeMetadata ──> CacheClientInstaller::apply <────┘
//! ```

pub mod apt;
pub mod assignment;
pub mod client;
pub mod installer;
pub mod registry;
pub mod server;
pub mod strategy;

pub use apt::AptCache;
pub use assignment::{CacheServerRecord, CacheServers};
pub use client::CacheClientInstaller;
pub use installer::{InstallerBase, DEFAULT_SCRIPT_TIMEOUT};
pub use registry::{strategies_from_names, strategy_by_name, AVAILABLE_STRATEGIES};
pub use server::{CacheServerInstaller, ResolvedServer, ServerInstallation};
pub use strategy::CacheStrategy;
