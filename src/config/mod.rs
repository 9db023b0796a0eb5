//! Configuration module
//!
//! This module defines the monitor configuration aggregate: which address
//! ranges to scan, which ports to probe on them, and how discovered targets
//! map onto the generated HAProxy configuration. Loading and validation live
//! in the submodules.

// Submodules
pub mod defaults;
mod loader;
pub mod subnets;
mod validator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::common::MonitorError;

/// Probe protocol for a monitored port
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain TCP with a minimal HTTP request
    Http,
    /// TLS with peer verification disabled (probing only)
    Https,
}

// Custom deserialization implementation to make it case-insensitive
impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Protocol::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Default for Protocol {
    #[inline]
    fn default() -> Self {
        Self::Https
    }
}

impl fmt::Display for Protocol {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

impl FromStr for Protocol {
    type Err = MonitorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(MonitorError::Config(format!(
                "Invalid protocol: {}. Valid values are: http, https",
                s
            ))),
        }
    }
}

impl Protocol {
    /// Whether probes on this protocol perform a TLS handshake
    #[inline]
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Https)
    }
}

/// One routable service exposed at a numeric port within a range.
///
/// `path_prefix` and `path_match` are the SNI matching rules: a prefix rule
/// matches names ending in `<prefix>.<base-domain>` (any leading wildcard
/// marker is stripped for rule generation), a match rule matches
/// `<match>.<base-domain>` exactly. At most one of the two is meaningfully
/// used; when both are empty no switching rule is emitted for the port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct MonitorPort {
    /// Port number (1-65535)
    pub port: u16,

    /// Human-readable port name
    pub name: String,

    /// Wildcard SNI prefix rule, e.g. `*.apps`
    pub path_prefix: String,

    /// Exact SNI match rule, e.g. `api`
    pub path_match: String,

    /// Probe protocol, `https` when absent
    pub protocol: Protocol,

    /// Addresses that answered on this port, rebuilt from scratch every sweep
    pub targets: Vec<String>,
}

impl MonitorPort {
    /// The raw prefix used to match certificate SAN names during discovery.
    ///
    /// `path_prefix` wins over `path_match`; `None` when neither rule is
    /// configured, in which case the port cannot discover a base domain.
    pub fn match_prefix(&self) -> Option<&str> {
        if !self.path_prefix.is_empty() {
            Some(&self.path_prefix)
        } else if !self.path_match.is_empty() {
            Some(&self.path_match)
        } else {
            None
        }
    }

    /// Name of the shared frontend section owning this port's bind line
    pub fn frontend_name(&self) -> String {
        format!("dyna-frontend-{}", self.port)
    }
}

/// One scan unit: an inclusive IPv4 range and the ports probed on it.
///
/// `base_domain` is discovered, not configured, when the range is sourced
/// from network scanning; it is authoritative when the range is synthesized
/// from a control-plane tenant directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct MonitorRange {
    /// First address of the range (inclusive)
    pub ip_address_start: String,

    /// Last address of the range (inclusive)
    pub ip_address_end: String,

    /// Ports probed on every address in the range
    pub monitor_ports: Vec<MonitorPort>,

    /// Domain suffix shared by the range's endpoints
    pub base_domain: String,
}

/// The monitor configuration aggregate.
///
/// Owned exclusively by the sweep/synthesis cycle; all concurrent access goes
/// through [`SharedMonitorConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct MonitorConfig {
    /// Scan units, in configuration order (synthesis order follows it)
    pub monitor_ranges: Vec<MonitorRange>,

    /// Per-probe timeout in milliseconds
    pub check_timeout: u64,

    /// Header text prefixed verbatim to all generated output
    pub haproxy_header: String,

    /// Source targets from a control-plane tenant directory instead of
    /// scanning the configured ranges
    pub control_plane_enable: bool,

    /// Bind address for generated frontends, `0.0.0.0` when absent
    pub bind_address: Option<String>,

    /// Optional datacenter subnet catalog (JSON) appended to the ranges
    pub subnets_file: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            monitor_ranges: Vec::new(),
            check_timeout: defaults::check_timeout(),
            haproxy_header: String::new(),
            control_plane_enable: false,
            bind_address: None,
            subnets_file: None,
        }
    }
}

impl MonitorConfig {
    /// Bind address for generated frontends
    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(defaults::BIND_ADDRESS)
    }
}

/// Top-level configuration file shape (`monitor-config:` document root)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct MonitorConfigSpec {
    pub monitor_config: MonitorConfig,
}

/// The single shared mutable aggregate.
///
/// Scanners merge results under this lock at their join points; readers
/// (synthesis, the gate) acquire the same lock, so a partially-updated range
/// is never observed mid-sweep.
pub type SharedMonitorConfig = Arc<Mutex<MonitorConfig>>;
