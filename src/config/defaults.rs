//! Default configuration values
//!
//! Single source of truth for defaults and fixed operating constants, so the
//! same values back serde defaults, clap defaults, and the scan engine.

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "monitor-config.yaml";

/// Default generated-configuration output path
pub const DEFAULT_OUTPUT_FILE: &str = "/etc/haproxy/haproxy.cfg";

/// Default reload command executed after a successful write
pub const DEFAULT_RELOAD_COMMAND: &str = "systemctl reload haproxy";

/// Default bind address for generated frontends
pub const BIND_ADDRESS: &str = "0.0.0.0";

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Offset added to a service port to form its frontend bind port
pub const FRONTEND_PORT_OFFSET: u32 = 10000;

/// TCP content inspection delay for generated frontends, in milliseconds
pub const TCP_INSPECT_DELAY_MS: u32 = 5000;

/// Maximum number of ranges scanned concurrently during a sweep
pub const RANGE_WORKERS: usize = 10;

/// Maximum number of in-flight probes within one range scan
pub const PROBE_WORKERS: usize = 25;

/// Control-plane API port for synthetic tenant ranges
pub const API_PORT: u16 = 6443;

/// Control-plane ingress port for synthetic tenant ranges
pub const INGRESS_PORT: u16 = 443;

/// SNI match rule for the tenant API port
pub const API_PATH_MATCH: &str = "api";

/// SNI prefix rule for the tenant ingress port
pub const INGRESS_PATH_PREFIX: &str = "*.apps";

/// Default per-probe timeout in milliseconds
pub fn check_timeout() -> u64 {
    2000
}

/// Default log level
pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}

/// Default reconcile interval in seconds
pub fn interval_secs() -> u64 {
    30
}
