//! Cache strategy abstraction
//!
//! A strategy encapsulates one kind of package repository cache (apt,
//! yum, pip, ...): which systems it runs on and the two scripts needed
//! to install a server and to point a client at it.

use crate::compute::types::{Image, NodeMetadata, OperatingSystem, OsFamily, ScriptFamily};
use crate::error::FleetCacheResult;

/// Per-repository-kind cache logic
///
/// Implementations are stateless; rendering the same inputs always yields
/// the same script.
pub trait CacheStrategy: Send + Sync {
    /// Name of the cached package repository (e.g. "apt")
    fn name(&self) -> &'static str;

    /// TCP port the cache proxy listens on
    fn port(&self) -> u16;

    /// Distribution families this cache supports, on both ends
    fn supported_families(&self) -> &'static [OsFamily];

    /// Whether a server for this cache can be installed on `image`
    fn is_server_compatible(&self, image: &Image) -> bool {
        self.matches_os(image.operating_system.as_ref(), &image.name)
    }

    /// Whether `node` can be configured to use this cache
    fn is_client_compatible(&self, node: &NodeMetadata) -> bool {
        self.matches_os(node.operating_system.as_ref(), node.display_name())
    }

    /// Structured family when known; otherwise a case-insensitive
    /// substring match of the family names against `name`
    fn matches_os(&self, os: Option<&OperatingSystem>, name: &str) -> bool {
        let families = self.supported_families();
        match os {
            Some(os) => families.contains(&os.family),
            None => {
                let lower = name.to_lowercase();
                families.iter().any(|f| lower.contains(f.as_str()))
            }
        }
    }

    /// Script that installs, starts and enables the cache proxy
    fn server_install_script(&self, family: ScriptFamily) -> FleetCacheResult<String>;

    /// Script that routes the package manager through `server_address`
    fn client_configure_script(
        &self,
        family: ScriptFamily,
        server_address: &str,
    ) -> FleetCacheResult<String>;
}
