//! Compute service integration
//!
//! Provides the provisioning collaborator used by the cache installers:
//! - Inventory: JSON node inventory + external run/provision commands
//! - In-memory: records actions without touching any node (dry runs)

mod factory;
mod inventory;
mod memory;
mod service;
pub mod types;

pub use factory::{create_compute, create_dry_run_compute};
pub use inventory::InventoryCompute;
pub use memory::{MemoryCompute, RecordedScript};
pub use service::ComputeService;
pub use types::{
    ExecResponse, Image, NodeMetadata, OperatingSystem, OsFamily, ScriptFamily, Template,
};
