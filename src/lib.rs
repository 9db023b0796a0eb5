//! HAProxy Autoconf: dynamic HAProxy configuration from live endpoint discovery
//!
//! This library scans configured IPv4 ranges for live TLS/HTTP endpoints,
//! derives each range's base domain from certificate Subject Alternative
//! Names, and synthesizes an SNI-routed HAProxy TCP configuration from the
//! results. A content fingerprint gates the apply step so an unchanged
//! configuration never triggers a reload.
//!
//! # Main Features
//!
//! - Bounded-concurrency range scanning with plain and TLS probes
//! - Base-domain discovery from certificate SANs (verification disabled,
//!   probing only)
//! - Deterministic frontend/backend/switching-rule synthesis
//! - Change detection via SHA-512 content fingerprints
//! - Optional control-plane tenant directory in place of network scanning
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use haproxy_autoconf::config::MonitorConfig;
//! use haproxy_autoconf::haproxy::{render, FingerprintGate, GateDecision};
//! use haproxy_autoconf::scan::run_sweep;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> haproxy_autoconf::Result<()> {
//!     let config = MonitorConfig::load("monitor-config.yaml")?;
//!     let shared = Arc::new(Mutex::new(config));
//!     let cancel = CancellationToken::new();
//!
//!     run_sweep(&shared, &cancel).await;
//!
//!     let rendered = {
//!         let config = shared.lock().unwrap();
//!         render(&config)
//!     };
//!
//!     let mut gate = FingerprintGate::new();
//!     if gate.evaluate(&rendered) == GateDecision::Changed {
//!         // push `rendered.text` to the configuration sink, then:
//!         gate.record_applied(&rendered);
//!     }
//!     Ok(())
//! }
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod haproxy;
pub mod scan;
pub mod sink;
pub mod tenants;

// Re-export commonly used structures and functions for convenience
pub use common::{MonitorError, Result};
pub use config::{MonitorConfig, MonitorPort, MonitorRange, SharedMonitorConfig};
pub use haproxy::{render, FingerprintGate, GateDecision, RenderedConfig};
pub use scan::run_sweep;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
