//! Cache server installer
//!
//! Finds the single cache server for a template's OS family, booting one
//! if none exists, and installs every compatible cache strategy on it.
//!
//! # Server discovery
//!
//! | Nodes in `<prefix>-<family>` | Outcome |
//! |------------------------------|---------|
//! | 0 | create one from the template, run admin bootstrap |
//! | 1 | reuse it |
//! | 2+ | `MultipleCacheServers`, nothing touched |
//!
//! Discovery is not transactional. Two installers racing on an empty
//! group can both create a node; the next run then reports the duplicate.

use crate::cache::assignment::{CacheServerRecord, CacheServers};
use crate::cache::installer::InstallerBase;
use crate::compute::types::{NodeMetadata, OsFamily, Template};
use crate::error::{FleetCacheError, FleetCacheResult};
use tracing::{debug, info};

/// The node chosen to host cache servers
#[derive(Debug, Clone)]
pub struct ResolvedServer {
    pub node: NodeMetadata,
    pub group: String,
    /// Whether the node was created by this run
    pub created: bool,
}

/// Outcome of a server installation
#[derive(Debug, Clone)]
pub struct ServerInstallation {
    pub server: ResolvedServer,
    /// Strategies installed on the server
    pub installed: CacheServers,
}

/// Installs cache servers for every compatible strategy
pub struct CacheServerInstaller {
    base: InstallerBase,
    group_prefix: String,
    bootstrap: Option<String>,
}

impl CacheServerInstaller {
    pub fn new(base: InstallerBase, group_prefix: impl Into<String>) -> Self {
        Self {
            base,
            group_prefix: group_prefix.into(),
            bootstrap: None,
        }
    }

    /// Script run once on newly created servers before any install
    pub fn with_bootstrap(mut self, script: impl Into<String>) -> Self {
        self.bootstrap = Some(script.into());
        self
    }

    /// Group name for cache servers of `family`
    pub fn group_for(&self, family: OsFamily) -> String {
        format!("{}-{}", self.group_prefix, family.as_str())
    }

    /// Resolve the cache server for `template` and install compatible
    /// strategies on it
    ///
    /// Any failure aborts the whole call; strategies are only reported as
    /// installed when the call as a whole succeeds.
    pub async fn apply(&self, template: &Template) -> FleetCacheResult<ServerInstallation> {
        let server = self.resolve_server(template).await?;
        let script_family = template.image.os_family().script_family();
        let record = CacheServerRecord::from_node(&server.node, &server.group);
        let mut installed = CacheServers::new();

        for strategy in self.base.server_compatible(&template.image) {
            info!(
                "Installing {} cache server on node: {}",
                strategy.name(),
                server.node.id
            );
            let script = strategy.server_install_script(script_family)?;
            self.base.run_checked(&server.node, &script).await?;
            installed.insert(strategy.name(), record.clone());
        }

        if installed.is_empty() {
            info!(
                "No cache strategy is compatible with image {}",
                template.image.name
            );
        }

        Ok(ServerInstallation { server, installed })
    }

    /// Find the cache server for the template's OS family, creating it
    /// when the group is empty
    pub async fn resolve_server(&self, template: &Template) -> FleetCacheResult<ResolvedServer> {
        let family = template.image.os_family();
        let group = self.group_for(family);
        let prefix = self.group_prefix.as_str();
        let suffix = family.as_str();

        let mut matches = self
            .base
            .compute()
            .list_nodes_matching(&|node: &NodeMetadata| node.in_group_matching(prefix, suffix))
            .await?;

        match matches.len() {
            0 => {
                info!("No cache server was found. Creating a new one in group {}", group);
                let node = self.create_server(&group, template).await?;
                Ok(ResolvedServer {
                    node,
                    group,
                    created: true,
                })
            }
            1 => {
                let node = matches.remove(0);
                debug!("Reusing cache server {} in group {}", node.id, group);
                Ok(ResolvedServer {
                    node,
                    group,
                    created: false,
                })
            }
            count => Err(FleetCacheError::MultipleCacheServers { group, count }),
        }
    }

    async fn create_server(&self, group: &str, template: &Template) -> FleetCacheResult<NodeMetadata> {
        let mut nodes = self
            .base
            .compute()
            .create_nodes_in_group(group, 1, template)
            .await?;

        if nodes.len() != 1 {
            return Err(FleetCacheError::NodeCreation {
                group: group.to_string(),
                reason: format!("expected 1 node, backend returned {}", nodes.len()),
            });
        }
        let node = nodes.remove(0);
        info!("New cache server node created: {}", node.id);

        if let Some(bootstrap) = &self.bootstrap {
            debug!("Running admin access bootstrap on {}", node.id);
            self.base.run_checked(&node, bootstrap).await?;
        }

        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::apt::AptCache;
    use crate::cache::strategy::CacheStrategy;
    use crate::compute::types::{ExecResponse, Image, OperatingSystem, ScriptFamily};
    use crate::compute::{ComputeService, MemoryCompute};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn template(family: OsFamily) -> Template {
        Template::new(Image {
            id: "img-1".to_string(),
            name: format!("{} image", family),
            operating_system: Some(OperatingSystem::new(family)),
        })
    }

    fn server_node(id: &str, group: &str) -> NodeMetadata {
        NodeMetadata {
            id: id.to_string(),
            name: id.to_string(),
            hostname: None,
            group: Some(group.to_string()),
            operating_system: Some(OperatingSystem::new(OsFamily::Ubuntu)),
            private_addresses: vec!["10.0.0.5".to_string()],
            public_addresses: vec![],
        }
    }

    fn installer(compute: Arc<MemoryCompute>) -> CacheServerInstaller {
        let strategies: Vec<Arc<dyn CacheStrategy>> = vec![Arc::new(AptCache::new())];
        CacheServerInstaller::new(InstallerBase::new(compute, strategies), "cache-server")
    }

    /// Second apt-family strategy whose install script the backend rejects
    struct MirrorCache;

    impl CacheStrategy for MirrorCache {
        fn name(&self) -> &'static str {
            "mirror"
        }

        fn port(&self) -> u16 {
            8080
        }

        fn supported_families(&self) -> &'static [OsFamily] {
            &[OsFamily::Ubuntu]
        }

        fn server_install_script(&self, _family: ScriptFamily) -> FleetCacheResult<String> {
            Ok("install-mirror\n".to_string())
        }

        fn client_configure_script(
            &self,
            _family: ScriptFamily,
            _server_address: &str,
        ) -> FleetCacheResult<String> {
            Ok(String::new())
        }
    }

    /// Delegates to `MemoryCompute`, failing scripts that contain `reject`
    struct RejectingCompute {
        inner: MemoryCompute,
        reject: &'static str,
    }

    #[async_trait]
    impl ComputeService for RejectingCompute {
        async fn list_nodes(&self) -> FleetCacheResult<Vec<NodeMetadata>> {
            self.inner.list_nodes().await
        }

        async fn create_nodes_in_group(
            &self,
            group: &str,
            count: usize,
            template: &Template,
        ) -> FleetCacheResult<Vec<NodeMetadata>> {
            self.inner.create_nodes_in_group(group, count, template).await
        }

        async fn run_script(&self, node_id: &str, script: &str) -> FleetCacheResult<ExecResponse> {
            let mut response = self.inner.run_script(node_id, script).await?;
            if script.contains(self.reject) {
                response.exit_status = 9;
            }
            Ok(response)
        }

        fn backend_name(&self) -> &'static str {
            "Rejecting"
        }
    }

    /// Backend whose creation call returns a fixed number of nodes
    struct FixedCountCompute(usize);

    #[async_trait]
    impl ComputeService for FixedCountCompute {
        async fn list_nodes(&self) -> FleetCacheResult<Vec<NodeMetadata>> {
            Ok(vec![])
        }

        async fn create_nodes_in_group(
            &self,
            group: &str,
            _count: usize,
            _template: &Template,
        ) -> FleetCacheResult<Vec<NodeMetadata>> {
            Ok((0..self.0)
                .map(|i| server_node(&format!("srv-{}", i), group))
                .collect())
        }

        async fn run_script(&self, _node_id: &str, _script: &str) -> FleetCacheResult<ExecResponse> {
            Ok(ExecResponse::default())
        }

        fn backend_name(&self) -> &'static str {
            "Fixed"
        }
    }

    #[tokio::test]
    async fn creates_server_when_none_exists() {
        let compute = Arc::new(MemoryCompute::new());
        let installer = installer(compute.clone()).with_bootstrap("useradd admin\n");

        let result = installer.apply(&template(OsFamily::Ubuntu)).await.unwrap();

        assert!(result.server.created);
        assert_eq!(result.server.group, "cache-server-ubuntu");
        assert_eq!(compute.created().len(), 1);

        let scripts = compute.scripts();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].script, "useradd admin\n");
        assert!(scripts[1].script.starts_with("apt-get -y install apt-cacher"));
        assert!(scripts.iter().all(|s| s.node_id == result.server.node.id));

        let record = result.installed.get("apt").unwrap();
        assert_eq!(record.node_id, result.server.node.id);
    }

    #[tokio::test]
    async fn reuses_single_existing_server() {
        let compute = Arc::new(MemoryCompute::with_nodes(vec![
            server_node("srv-1", "cache-server-ubuntu"),
            server_node("web-1", "web"),
        ]));
        let installer = installer(compute.clone()).with_bootstrap("useradd admin\n");

        let result = installer.apply(&template(OsFamily::Ubuntu)).await.unwrap();

        assert!(!result.server.created);
        assert_eq!(result.server.node.id, "srv-1");
        assert!(compute.created().is_empty());
        assert_eq!(compute.scripts().len(), 1);
        assert_eq!(
            result.installed.get("apt").unwrap().first_private_address(),
            Some("10.0.0.5")
        );
    }

    #[tokio::test]
    async fn multiple_servers_is_fatal_and_touches_nothing() {
        let compute = Arc::new(MemoryCompute::with_nodes(vec![
            server_node("srv-1", "cache-server-ubuntu"),
            server_node("srv-2", "cache-server-ubuntu"),
        ]));

        let err = installer(compute.clone())
            .apply(&template(OsFamily::Ubuntu))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FleetCacheError::MultipleCacheServers { ref group, count: 2 } if group == "cache-server-ubuntu"
        ));
        assert!(compute.created().is_empty());
        assert!(compute.scripts().is_empty());
    }

    #[tokio::test]
    async fn servers_of_other_families_are_ignored() {
        let compute = Arc::new(MemoryCompute::with_nodes(vec![server_node(
            "srv-debian",
            "cache-server-debian",
        )]));

        let result = installer(compute.clone())
            .apply(&template(OsFamily::Ubuntu))
            .await
            .unwrap();

        assert!(result.server.created);
        assert_eq!(compute.list_nodes().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn incompatible_image_installs_nothing() {
        let compute = Arc::new(MemoryCompute::new());

        let result = installer(compute.clone())
            .apply(&template(OsFamily::Centos))
            .await
            .unwrap();

        assert_eq!(result.server.group, "cache-server-centos");
        assert_eq!(compute.created().len(), 1);
        assert!(compute.scripts().is_empty());
        assert!(result.installed.is_empty());
    }

    #[tokio::test]
    async fn failed_install_records_no_server() {
        let compute = Arc::new(
            MemoryCompute::with_nodes(vec![server_node("srv-1", "cache-server-ubuntu")])
                .exiting_with(1),
        );

        let err = installer(compute.clone())
            .apply(&template(OsFamily::Ubuntu))
            .await
            .unwrap_err();

        assert!(matches!(err, FleetCacheError::ScriptFailed { exit_status: 1, .. }));
    }

    #[tokio::test]
    async fn group_uses_inferred_family_without_metadata() {
        let compute = Arc::new(MemoryCompute::new());
        let template = Template::new(Image {
            id: "img".to_string(),
            name: "Debian GNU/Linux 12".to_string(),
            operating_system: None,
        });

        let result = installer(compute).apply(&template).await.unwrap();

        assert_eq!(result.server.group, "cache-server-debian");
        assert!(result.installed.get("apt").is_some());
    }

    #[tokio::test]
    async fn failed_bootstrap_aborts_before_install() {
        let compute = Arc::new(MemoryCompute::new().exiting_with(1));
        let installer = installer(compute.clone()).with_bootstrap("useradd admin\n");

        let err = installer.apply(&template(OsFamily::Ubuntu)).await.unwrap_err();

        assert!(matches!(err, FleetCacheError::ScriptFailed { exit_status: 1, .. }));
        let scripts = compute.scripts();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].script, "useradd admin\n");
    }

    #[tokio::test]
    async fn creation_must_return_exactly_one_node() {
        for count in [0, 2] {
            let strategies: Vec<Arc<dyn CacheStrategy>> = vec![Arc::new(AptCache::new())];
            let base = InstallerBase::new(Arc::new(FixedCountCompute(count)), strategies);
            let installer = CacheServerInstaller::new(base, "cache-server");

            let err = installer.apply(&template(OsFamily::Ubuntu)).await.unwrap_err();

            assert!(
                matches!(err, FleetCacheError::NodeCreation { ref group, .. } if group == "cache-server-ubuntu"),
                "count {} gave {:?}",
                count,
                err
            );
        }
    }

    #[tokio::test]
    async fn later_strategy_failure_discards_earlier_installs() {
        let compute = Arc::new(RejectingCompute {
            inner: MemoryCompute::with_nodes(vec![server_node("srv-1", "cache-server-ubuntu")]),
            reject: "install-mirror",
        });
        let strategies: Vec<Arc<dyn CacheStrategy>> =
            vec![Arc::new(AptCache::new()), Arc::new(MirrorCache)];
        let installer =
            CacheServerInstaller::new(InstallerBase::new(compute.clone(), strategies), "cache-server");

        let result = installer.apply(&template(OsFamily::Ubuntu)).await;

        assert!(matches!(
            result,
            Err(FleetCacheError::ScriptFailed { exit_status: 9, .. })
        ));
        let scripts = compute.inner.scripts();
        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].script.starts_with("apt-get -y install apt-cacher"));
    }
}
