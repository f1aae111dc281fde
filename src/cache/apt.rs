//! apt-cacher strategy
//!
//! Everything needed to install and start an apt-cacher server and to
//! configure Debian-family clients to fetch through it.

use crate::cache::strategy::CacheStrategy;
use crate::compute::types::{OsFamily, ScriptFamily};
use crate::error::{FleetCacheError, FleetCacheResult};

/// Port apt-cacher listens on
pub const APT_CACHER_PORT: u16 = 3142;

const SUPPORTED: &[OsFamily] = &[OsFamily::Ubuntu, OsFamily::Debian];

const SERVER_SCRIPT: &str = "apt-get -y install apt-cacher\n\
echo 'path_map = ubuntu us.archive.ubuntu.com/ubuntu' >> /etc/apt-cacher/apt-cacher.conf\n\
sed -i 's/AUTOSTART=0/AUTOSTART=1/' /etc/default/apt-cacher\n\
/etc/init.d/apt-cacher start\n";

/// apt-cacher cache
#[derive(Debug, Clone, Copy, Default)]
pub struct AptCache;

impl AptCache {
    pub fn new() -> Self {
        Self
    }

    fn unsupported(&self, family: ScriptFamily) -> FleetCacheError {
        FleetCacheError::UnsupportedScriptFamily {
            strategy: self.name().to_string(),
            family: family.to_string(),
        }
    }
}

impl CacheStrategy for AptCache {
    fn name(&self) -> &'static str {
        "apt"
    }

    fn port(&self) -> u16 {
        APT_CACHER_PORT
    }

    fn supported_families(&self) -> &'static [OsFamily] {
        SUPPORTED
    }

    fn server_install_script(&self, family: ScriptFamily) -> FleetCacheResult<String> {
        match family {
            ScriptFamily::Unix => Ok(SERVER_SCRIPT.to_string()),
            ScriptFamily::Windows => Err(self.unsupported(family)),
        }
    }

    fn client_configure_script(
        &self,
        family: ScriptFamily,
        server_address: &str,
    ) -> FleetCacheResult<String> {
        match family {
            ScriptFamily::Unix => Ok(format!(
                "sed -i 's/http:\\/\\//http:\\/\\/{}:{}\\//' /etc/apt/sources.list\n\
                 apt-get check\n",
                server_address, APT_CACHER_PORT
            )),
            ScriptFamily::Windows => Err(self.unsupported(family)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::types::{Image, NodeMetadata, OperatingSystem};

    fn image(name: &str, family: Option<OsFamily>) -> Image {
        Image {
            id: "img".to_string(),
            name: name.to_string(),
            operating_system: family.map(OperatingSystem::new),
        }
    }

    fn node(hostname: &str, family: Option<OsFamily>) -> NodeMetadata {
        NodeMetadata {
            id: "node".to_string(),
            name: "node".to_string(),
            hostname: Some(hostname.to_string()),
            group: None,
            operating_system: family.map(OperatingSystem::new),
            private_addresses: vec![],
            public_addresses: vec![],
        }
    }

    #[test]
    fn debian_family_images_are_server_compatible() {
        let apt = AptCache::new();
        assert!(apt.is_server_compatible(&image("x", Some(OsFamily::Ubuntu))));
        assert!(apt.is_server_compatible(&image("x", Some(OsFamily::Debian))));

        for family in [OsFamily::Centos, OsFamily::Rhel, OsFamily::Windows, OsFamily::Unrecognized] {
            assert!(!apt.is_server_compatible(&image("x", Some(family))));
        }
    }

    #[test]
    fn structured_family_wins_over_name() {
        let apt = AptCache::new();
        assert!(!apt.is_server_compatible(&image("ubuntu-lookalike", Some(OsFamily::Centos))));
    }

    #[test]
    fn image_name_fallback_is_case_insensitive() {
        let apt = AptCache::new();
        assert!(apt.is_server_compatible(&image("Ubuntu 22.04 Server", None)));
        assert!(apt.is_server_compatible(&image("DEBIAN-bookworm", None)));
        assert!(!apt.is_server_compatible(&image("CentOS 7", None)));
    }

    #[test]
    fn client_compatibility_uses_hostname_fallback() {
        let apt = AptCache::new();
        assert!(apt.is_client_compatible(&node("ubuntu-worker-3", None)));
        assert!(apt.is_client_compatible(&node("anything", Some(OsFamily::Debian))));
        assert!(!apt.is_client_compatible(&node("fedora-box", None)));
    }

    #[test]
    fn server_script_literal() {
        let script = AptCache::new().server_install_script(ScriptFamily::Unix).unwrap();
        assert_eq!(
            script,
            "apt-get -y install apt-cacher\n\
             echo 'path_map = ubuntu us.archive.ubuntu.com/ubuntu' >> /etc/apt-cacher/apt-cacher.conf\n\
             sed -i 's/AUTOSTART=0/AUTOSTART=1/' /etc/default/apt-cacher\n\
             /etc/init.d/apt-cacher start\n"
        );
    }

    #[test]
    fn client_script_routes_through_server() {
        let script = AptCache::new()
            .client_configure_script(ScriptFamily::Unix, "10.0.0.5")
            .unwrap();
        assert_eq!(
            script,
            r"sed -i 's/http:\/\//http:\/\/10.0.0.5:3142\//' /etc/apt/sources.list
apt-get check
"
        );
    }

    #[test]
    fn client_script_is_idempotent() {
        let apt = AptCache::new();
        let first = apt.client_configure_script(ScriptFamily::Unix, "10.0.0.5").unwrap();
        let second = apt.client_configure_script(ScriptFamily::Unix, "10.0.0.5").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn windows_scripts_are_unsupported() {
        let apt = AptCache::new();
        let err = apt.server_install_script(ScriptFamily::Windows).unwrap_err();
        assert!(matches!(err, FleetCacheError::UnsupportedScriptFamily { .. }));
        assert!(apt
            .client_configure_script(ScriptFamily::Windows, "10.0.0.5")
            .is_err());
    }
}
