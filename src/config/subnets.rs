//! Subnet catalog ingestion
//!
//! Turns a datacenter subnet catalog (JSON document of datacenter -> VLAN ->
//! address allocations) into monitor ranges carrying the standard API and
//! ingress port pair. The document is parsed into typed structs at this
//! boundary; nothing untyped crosses into the core.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::common::{MonitorError, Result};
use crate::config::{defaults, MonitorPort, MonitorRange};

/// Index into a VLAN's address allocation marking the end of the reserved
/// block monitored for control-plane endpoints.
const RESERVED_BLOCK_END: usize = 10;

/// One VLAN's address allocation within the catalog
#[derive(Debug, Clone, Deserialize)]
struct Subnet {
    #[serde(rename = "ipAddresses")]
    ip_addresses: Vec<String>,
}

/// Catalogs are keyed by datacenter, then VLAN. `BTreeMap` keeps traversal
/// order stable so the synthesized configuration order (and fingerprint) does
/// not depend on document key order.
type SubnetCatalog = BTreeMap<String, BTreeMap<String, Subnet>>;

/// Read a subnet catalog and produce one monitor range per VLAN.
pub fn ranges_from_subnets_file<P: AsRef<Path>>(path: P) -> Result<Vec<MonitorRange>> {
    let path = path.as_ref();
    info!("reading subnets from {}", path.display());

    let raw = fs::read(path).map_err(|e| {
        MonitorError::Config(format!("unable to read {}: {}", path.display(), e))
    })?;
    let catalog: SubnetCatalog = serde_json::from_slice(&raw).map_err(|e| {
        MonitorError::Config(format!("unable to parse {}: {}", path.display(), e))
    })?;

    let mut ranges = Vec::new();
    for (datacenter, vlans) in &catalog {
        for (vlan, subnet) in vlans {
            if subnet.ip_addresses.len() <= RESERVED_BLOCK_END {
                warn!(
                    "skipping {}/{}: {} address(es), need at least {}",
                    datacenter,
                    vlan,
                    subnet.ip_addresses.len(),
                    RESERVED_BLOCK_END + 1
                );
                continue;
            }
            ranges.push(MonitorRange {
                ip_address_start: subnet.ip_addresses[0].clone(),
                ip_address_end: subnet.ip_addresses[RESERVED_BLOCK_END].clone(),
                monitor_ports: control_plane_ports(),
                ..Default::default()
            });
        }
    }
    Ok(ranges)
}

/// The standard API + ingress port pair probed on control-plane ranges
pub(crate) fn control_plane_ports() -> Vec<MonitorPort> {
    vec![
        MonitorPort {
            port: defaults::API_PORT,
            name: "api".to_string(),
            path_match: defaults::API_PATH_MATCH.to_string(),
            ..Default::default()
        },
        MonitorPort {
            port: defaults::INGRESS_PORT,
            name: "ingress-https".to_string(),
            path_prefix: defaults::INGRESS_PATH_PREFIX.to_string(),
            ..Default::default()
        },
    ]
}
