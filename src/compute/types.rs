//! Compute metadata types
//!
//! Read-only descriptions of images, nodes and templates as reported by
//! the compute service. Cache strategies use them only to decide
//! compatibility and to pick an address to route clients to.

use crate::error::{FleetCacheError, FleetCacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system distribution family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OsFamily {
    Ubuntu,
    Debian,
    Centos,
    Rhel,
    Fedora,
    AmznLinux,
    Suse,
    Arch,
    Windows,
    Unrecognized,
}

impl OsFamily {
    /// All known families, in name-inference order
    pub const ALL: [OsFamily; 10] = [
        OsFamily::Ubuntu,
        OsFamily::Debian,
        OsFamily::Centos,
        OsFamily::Rhel,
        OsFamily::Fedora,
        OsFamily::AmznLinux,
        OsFamily::Suse,
        OsFamily::Arch,
        OsFamily::Windows,
        OsFamily::Unrecognized,
    ];

    /// Lowercase identifier, also used as the cache server group suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Debian => "debian",
            Self::Centos => "centos",
            Self::Rhel => "rhel",
            Self::Fedora => "fedora",
            Self::AmznLinux => "amzn-linux",
            Self::Suse => "suse",
            Self::Arch => "arch",
            Self::Windows => "windows",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Substrings that identify this family in a free-form display name
    fn name_markers(&self) -> &'static [&'static str] {
        match self {
            Self::Ubuntu => &["ubuntu"],
            Self::Debian => &["debian"],
            Self::Centos => &["centos"],
            Self::Rhel => &["rhel", "red hat"],
            Self::Fedora => &["fedora"],
            Self::AmznLinux => &["amzn", "amazon linux"],
            Self::Suse => &["suse"],
            Self::Arch => &["archlinux", "arch linux"],
            Self::Windows => &["windows"],
            Self::Unrecognized => &[],
        }
    }

    /// Guess the family from an image or host name (case-insensitive)
    pub fn infer_from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|family| family.name_markers().iter().any(|m| lower.contains(m)))
    }

    /// Shell dialect scripts for this family are rendered in
    pub fn script_family(&self) -> ScriptFamily {
        match self {
            Self::Windows => ScriptFamily::Windows,
            _ => ScriptFamily::Unix,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = FleetCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "amazon-linux" | "amzn" => return Ok(Self::AmznLinux),
            "redhat" | "red-hat" => return Ok(Self::Rhel),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|family| family.as_str() == normalized)
            .ok_or_else(|| FleetCacheError::UnknownOsFamily(s.to_string()))
    }
}

/// Shell dialect a script is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptFamily {
    Unix,
    Windows,
}

impl fmt::Display for ScriptFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix => write!(f, "unix"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Structured operating system metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingSystem {
    pub family: OsFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OperatingSystem {
    pub fn new(family: OsFamily) -> Self {
        Self {
            family,
            version: None,
            description: None,
        }
    }
}

/// A bootable image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    /// Display name, used when OS metadata is missing
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<OperatingSystem>,
}

impl Image {
    /// Resolved OS family: structured metadata first, then the display name
    pub fn os_family(&self) -> OsFamily {
        self.operating_system
            .as_ref()
            .map(|os| os.family)
            .or_else(|| OsFamily::infer_from_name(&self.name))
            .unwrap_or(OsFamily::Unrecognized)
    }
}

/// A provisioned node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<OperatingSystem>,
    #[serde(default)]
    pub private_addresses: Vec<String>,
    #[serde(default)]
    pub public_addresses: Vec<String>,
}

impl NodeMetadata {
    /// Hostname when known, else the node name
    pub fn display_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.name)
    }

    /// Resolved OS family: structured metadata first, then the display name
    pub fn os_family(&self) -> OsFamily {
        self.operating_system
            .as_ref()
            .map(|os| os.family)
            .or_else(|| OsFamily::infer_from_name(self.display_name()))
            .unwrap_or(OsFamily::Unrecognized)
    }

    pub fn script_family(&self) -> ScriptFamily {
        self.os_family().script_family()
    }

    /// Whether this node belongs to a group with the given prefix and suffix
    pub fn in_group_matching(&self, prefix: &str, suffix: &str) -> bool {
        self.group
            .as_deref()
            .is_some_and(|g| g.starts_with(prefix) && g.ends_with(suffix))
    }

    /// Address used to reach the node from the operator's machine
    pub fn reachable_address(&self) -> Option<&str> {
        self.public_addresses
            .first()
            .or_else(|| self.private_addresses.first())
            .map(String::as_str)
            .or(self.hostname.as_deref())
    }
}

/// Specification for creating new nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub image: Image,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Template {
    pub fn new(image: Image) -> Self {
        Self {
            image,
            hardware: None,
            location: None,
        }
    }
}

/// Result of running a script on a node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecResponse {
    pub exit_status: i32,
    pub output: String,
    pub error: String,
}

impl ExecResponse {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Parse a family from config, treating an empty value as absent
pub fn parse_optional_family(value: Option<&str>) -> FleetCacheResult<Option<OsFamily>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}
