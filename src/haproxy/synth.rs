//! Configuration synthesis
//!
//! Pure translation of the post-sweep aggregate into ordered routing
//! sections and their serialized text. Emission order follows configuration
//! order exactly, which is what keeps the fingerprint stable across
//! re-synthesis of unchanged input.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::common::content_fingerprint;
use crate::config::{defaults, MonitorConfig, MonitorPort};
use crate::haproxy::{Section, SectionKind};

/// A fully rendered configuration, ready for the gate and the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    /// Header plus all sections, in emission order
    pub text: String,
    /// URL-safe digest of `text`
    pub fingerprint: String,
    /// Base domains that contributed at least one backend
    pub base_domains: BTreeSet<String>,
}

/// Synthesize routing sections from the aggregate.
///
/// Per range, then per port within the range, in configuration order. Ports
/// with no discovered targets, and ranges with no base domain, emit nothing.
/// Frontends are shared: one `dyna-frontend-<port>` section per distinct
/// port, placed at its first use, collecting one switching rule per
/// participating range.
pub fn build_sections(config: &MonitorConfig) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut frontend_index: BTreeMap<u16, usize> = BTreeMap::new();

    for range in &config.monitor_ranges {
        for port in &range.monitor_ports {
            if port.targets.is_empty() || range.base_domain.is_empty() {
                // Normal transient state during discovery, nothing to route.
                continue;
            }

            let backend_name = format!("{}-{}", range.base_domain, port.port);

            let frontend_idx = match frontend_index.get(&port.port) {
                Some(idx) => *idx,
                None => {
                    debug!("creating frontend {}", port.frontend_name());
                    sections.push(create_frontend(port, config.bind_address()));
                    let idx = sections.len() - 1;
                    frontend_index.insert(port.port, idx);
                    idx
                }
            };

            debug!("creating backend {}", backend_name);
            sections.push(create_backend(&backend_name, port));

            if let Some(rule) = switching_rule(&range.base_domain, &backend_name, port) {
                sections[frontend_idx].push_attribute(rule);
            }
        }
    }

    sections
}

/// Render the aggregate: header text verbatim, then every section.
pub fn render(config: &MonitorConfig) -> RenderedConfig {
    let mut text = config.haproxy_header.clone();
    let mut base_domains = BTreeSet::new();

    for section in build_sections(config) {
        section.serialize_into(&mut text);
    }
    for range in &config.monitor_ranges {
        let routable = !range.base_domain.is_empty()
            && range.monitor_ports.iter().any(|port| !port.targets.is_empty());
        if routable {
            base_domains.insert(range.base_domain.clone());
        }
    }

    let fingerprint = content_fingerprint(text.as_bytes());
    RenderedConfig {
        text,
        fingerprint,
        base_domains,
    }
}

fn create_frontend(port: &MonitorPort, bind_address: &str) -> Section {
    let name = port.frontend_name();
    let bind_port = defaults::FRONTEND_PORT_OFFSET + u32::from(port.port);
    Section::new(
        SectionKind::Frontend,
        name.clone(),
        vec![
            "mode tcp".to_string(),
            format!("bind {}:{} name {}", bind_address, bind_port, name),
            "tcp-request content accept if { req_ssl_hello_type 1 }".to_string(),
            format!("tcp-request inspect-delay {}", defaults::TCP_INSPECT_DELAY_MS),
        ],
    )
}

fn create_backend(name: &str, port: &MonitorPort) -> Section {
    let mut backend = Section::new(SectionKind::Backend, name, vec!["mode tcp".to_string()]);
    for target in &port.targets {
        backend.push_attribute(format!(
            "server {target}-{port} {target}:{port} check verify none",
            target = target,
            port = port.port
        ));
    }
    backend
}

/// The switching rule attaching `backend_name` to the port's frontend.
///
/// A `path_prefix` rule matches SNI names ending in `<prefix>.<domain>` with
/// the leading wildcard marker stripped; a `path_match` rule matches
/// `<match>.<domain>` case-insensitively. No rule when both are empty.
fn switching_rule(base_domain: &str, backend_name: &str, port: &MonitorPort) -> Option<String> {
    if !port.path_prefix.is_empty() {
        let prefix = port.path_prefix.strip_prefix('*').unwrap_or(&port.path_prefix);
        Some(format!(
            "use_backend {} if {{ req.ssl_sni -m end {}.{} }}",
            backend_name, prefix, base_domain
        ))
    } else if !port.path_match.is_empty() {
        Some(format!(
            "use_backend {} if {{ req.ssl_sni -i {}.{} }}",
            backend_name, port.path_match, base_domain
        ))
    } else {
        None
    }
}
