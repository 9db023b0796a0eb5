//! Control-plane tenant directory
//!
//! When control-plane discovery is enabled, targets come from a tenant
//! directory instead of network scanning: each tenant maps to a synthetic
//! range with the API and ingress endpoints pre-resolved, and the tenant key
//! is the authoritative base domain. The directory itself (a cluster
//! controller, a file, a test fixture) stays behind the [`TenantDirectory`]
//! trait.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::common::{MonitorError, Result};
use crate::config::{defaults, MonitorPort, MonitorRange, SharedMonitorConfig};

/// Resolved endpoints for one tenant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct TenantEndpoints {
    /// Address answering on the API port (6443); empty when not yet known
    pub api_address: String,
    /// Address answering on the ingress port (443); empty when not yet known
    pub ingress_address: String,
}

/// Tenant key (base domain) to endpoints.
///
/// Ordered so that synthesis order, and therefore the fingerprint, does not
/// depend on directory iteration order.
pub type TenantTargets = BTreeMap<String, TenantEndpoints>;

/// Source of control-plane tenant targets
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// A complete snapshot of the currently known tenants.
    async fn snapshot(&self) -> Result<TenantTargets>;
}

/// In-memory directory with read/update semantics, for embedding and tests.
#[derive(Debug, Default)]
pub struct StaticTenantDirectory {
    targets: Mutex<TenantTargets>,
}

impl StaticTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one tenant's endpoints.
    pub fn upsert(&self, tenant: impl Into<String>, endpoints: TenantEndpoints) {
        self.targets.lock().unwrap().insert(tenant.into(), endpoints);
    }

    /// Forget a tenant.
    pub fn remove(&self, tenant: &str) {
        self.targets.lock().unwrap().remove(tenant);
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn snapshot(&self) -> Result<TenantTargets> {
        Ok(self.targets.lock().unwrap().clone())
    }
}

/// Directory backed by a JSON document of tenant key -> endpoints.
#[derive(Debug, Clone)]
pub struct FileTenantDirectory {
    path: PathBuf,
}

impl FileTenantDirectory {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl TenantDirectory for FileTenantDirectory {
    async fn snapshot(&self) -> Result<TenantTargets> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            MonitorError::TenantDirectory(format!(
                "unable to read {}: {}",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_slice(&raw).map_err(|e| {
            MonitorError::TenantDirectory(format!(
                "unable to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Translate tenants into synthetic monitor ranges.
///
/// Each tenant becomes one range with its key as base domain and the standard
/// port pair pre-resolved: API on 6443 (`path-match: api`), ingress on 443
/// (`path-prefix: *.apps`). Endpoints that are not yet known emit no port;
/// tenants with no known endpoint emit no range.
pub fn tenant_ranges(targets: &TenantTargets) -> Vec<MonitorRange> {
    let mut ranges = Vec::new();
    for (tenant, endpoints) in targets {
        let mut ports = Vec::new();
        if !endpoints.api_address.is_empty() {
            ports.push(MonitorPort {
                port: defaults::API_PORT,
                name: "api".to_string(),
                path_match: defaults::API_PATH_MATCH.to_string(),
                targets: vec![endpoints.api_address.clone()],
                ..Default::default()
            });
        }
        if !endpoints.ingress_address.is_empty() {
            ports.push(MonitorPort {
                port: defaults::INGRESS_PORT,
                name: "ingress-https".to_string(),
                path_prefix: defaults::INGRESS_PATH_PREFIX.to_string(),
                targets: vec![endpoints.ingress_address.clone()],
                ..Default::default()
            });
        }
        if ports.is_empty() {
            continue;
        }
        ranges.push(MonitorRange {
            base_domain: tenant.clone(),
            monitor_ports: ports,
            ..Default::default()
        });
    }
    ranges
}

/// Replace the aggregate's ranges from a directory snapshot.
///
/// Control-plane mode counterpart of a discovery sweep: a full replace, so
/// tenants absent from the snapshot drop out of the configuration.
pub async fn refresh_from_directory(
    shared: &SharedMonitorConfig,
    directory: &dyn TenantDirectory,
) -> Result<()> {
    let targets = directory.snapshot().await?;
    let ranges = tenant_ranges(&targets);
    debug!("tenant directory snapshot: {} routable range(s)", ranges.len());

    let mut config = shared.lock().unwrap();
    config.monitor_ranges = ranges;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn endpoints(api: &str, ingress: &str) -> TenantEndpoints {
        TenantEndpoints {
            api_address: api.to_string(),
            ingress_address: ingress.to_string(),
        }
    }

    #[test]
    fn test_tenant_ranges_shape() {
        let mut targets = TenantTargets::new();
        targets.insert("ci-op-1234-abcd.ci.example.com".to_string(), endpoints("10.0.1.5", "10.0.1.6"));

        let ranges = tenant_ranges(&targets);
        assert_eq!(ranges.len(), 1);

        let range = &ranges[0];
        assert_eq!(range.base_domain, "ci-op-1234-abcd.ci.example.com");
        assert_eq!(range.monitor_ports.len(), 2);

        let api = &range.monitor_ports[0];
        assert_eq!(api.port, 6443);
        assert_eq!(api.path_match, "api");
        assert_eq!(api.targets, vec!["10.0.1.5".to_string()]);

        let ingress = &range.monitor_ports[1];
        assert_eq!(ingress.port, 443);
        assert_eq!(ingress.path_prefix, "*.apps");
        assert_eq!(ingress.targets, vec!["10.0.1.6".to_string()]);
    }

    #[test]
    fn test_unknown_endpoints_are_omitted() {
        let mut targets = TenantTargets::new();
        targets.insert("api-only.example.com".to_string(), endpoints("10.0.1.5", ""));
        targets.insert("pending.example.com".to_string(), endpoints("", ""));

        let ranges = tenant_ranges(&targets);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].monitor_ports.len(), 1);
        assert_eq!(ranges[0].monitor_ports[0].port, 6443);
    }

    #[test]
    fn test_tenant_order_is_key_order() {
        let mut targets = TenantTargets::new();
        targets.insert("zeta.example.com".to_string(), endpoints("10.0.2.5", ""));
        targets.insert("alpha.example.com".to_string(), endpoints("10.0.1.5", ""));

        let ranges = tenant_ranges(&targets);
        assert_eq!(ranges[0].base_domain, "alpha.example.com");
        assert_eq!(ranges[1].base_domain, "zeta.example.com");
    }

    #[tokio::test]
    async fn test_refresh_replaces_ranges() {
        let shared: SharedMonitorConfig = Arc::new(Mutex::new(Default::default()));
        let directory = StaticTenantDirectory::new();
        directory.upsert("one.example.com", endpoints("10.0.1.5", "10.0.1.6"));

        refresh_from_directory(&shared, &directory).await.unwrap();
        assert_eq!(shared.lock().unwrap().monitor_ranges.len(), 1);

        // A tenant disappearing from the snapshot disappears from the config.
        directory.remove("one.example.com");
        refresh_from_directory(&shared, &directory).await.unwrap();
        assert!(shared.lock().unwrap().monitor_ranges.is_empty());
    }

    #[tokio::test]
    async fn test_file_directory_round_trip() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "hosted.example.com": {
                    "api-address": "10.0.3.5",
                    "ingress-address": "10.0.3.6"
                }
            }"#,
        )
        .unwrap();

        let directory = FileTenantDirectory::new(file.path());
        let targets = directory.snapshot().await.unwrap();
        assert_eq!(
            targets.get("hosted.example.com"),
            Some(&endpoints("10.0.3.5", "10.0.3.6"))
        );
    }

    #[tokio::test]
    async fn test_file_directory_missing_file_errors() {
        let directory = FileTenantDirectory::new("no-such-tenants.json");
        assert!(matches!(
            directory.snapshot().await,
            Err(MonitorError::TenantDirectory(_))
        ));
    }
}
