//! Configuration schema for fleetcache
//!
//! Configuration is stored at `~/.config/fleetcache/config.toml`

use crate::compute::types::{parse_optional_family, Image, OperatingSystem, Template};
use crate::error::FleetCacheResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache server discovery and template
    pub server: ServerConfig,

    /// Remote execution settings
    pub exec: ExecConfig,

    /// Admin access bootstrap for new servers
    pub admin: AdminConfig,

    /// Enabled cache strategies
    pub strategies: StrategiesConfig,

    /// Inventory and assignment files
    pub inventory: InventoryConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Group prefix; the OS family is appended as `<prefix>-<family>`
    pub group_prefix: String,

    /// Template for newly created cache servers
    pub template: TemplateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            group_prefix: "cache-server".to_string(),
            template: TemplateConfig::default(),
        }
    }
}

/// Node template as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Provider image identifier
    pub image_id: String,

    /// Image display name
    pub image_name: String,

    /// OS family (ubuntu, debian, centos, ...); inferred from the name when unset
    pub os_family: Option<String>,

    /// OS version
    pub os_version: Option<String>,

    /// Hardware profile
    pub hardware: Option<String>,

    /// Location or region
    pub location: Option<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            image_id: "ubuntu-22.04".to_string(),
            image_name: "Ubuntu 22.04 LTS".to_string(),
            os_family: Some("ubuntu".to_string()),
            os_version: Some("22.04".to_string()),
            hardware: None,
            location: None,
        }
    }
}

impl TemplateConfig {
    /// Build the compute template this configuration describes
    pub fn to_template(&self) -> FleetCacheResult<Template> {
        let operating_system =
            parse_optional_family(self.os_family.as_deref())?.map(|family| OperatingSystem {
                family,
                version: self.os_version.clone(),
                description: None,
            });

        Ok(Template {
            image: Image {
                id: self.image_id.clone(),
                name: self.image_name.clone(),
                operating_system,
            },
            hardware: self.hardware.clone(),
            location: self.location.clone(),
        })
    }
}

/// Remote execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Per-script completion timeout in seconds (default: 20 minutes)
    pub timeout_secs: u64,

    /// Command that runs a script read from stdin on `{host}`
    pub run_command: Vec<String>,

    /// Command that creates nodes and prints them as JSON.
    /// Placeholders: `{group}`, `{count}`, `{image}`, `{hardware}`, `{location}`
    pub provision_command: Option<Vec<String>>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 1200,
            run_command: ["ssh", "-o", "BatchMode=yes", "{host}", "sh", "-s"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            provision_command: None,
        }
    }
}

impl ExecConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Admin access bootstrap settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Run the bootstrap on newly created servers
    pub enabled: bool,

    /// Admin login to create (default: current user)
    pub user: Option<String>,

    /// Public key installed for the admin (default: ~/.ssh/id_rsa.pub)
    pub public_key_path: Option<PathBuf>,

    /// Grant passwordless sudo
    pub sudo: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user: None,
            public_key_path: None,
            sudo: true,
        }
    }
}

/// Cache strategy selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    /// Strategy names, in installation order
    pub enabled: Vec<String>,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            enabled: vec!["apt".to_string()],
        }
    }
}

/// Inventory file locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Node inventory JSON (default: state dir `inventory.json`)
    pub path: Option<PathBuf>,

    /// Cache server assignment JSON (default: state dir `servers.json`)
    pub assignment_path: Option<PathBuf>,
}
