//! Configuration validation
//!
//! Sanity checks applied once after loading. Range bounds are intentionally
//! not parsed here: a malformed range is a per-sweep condition handled by the
//! scanner (logged and skipped), not a startup failure.

use log::warn;

use crate::common::{MonitorError, Result};
use crate::config::MonitorConfig;

impl MonitorConfig {
    /// Validate the loaded configuration.
    pub fn validate(&self) -> Result<()> {
        if self.check_timeout == 0 {
            return Err(MonitorError::Config(
                "check-timeout must be greater than zero".to_string(),
            ));
        }

        for (range_idx, range) in self.monitor_ranges.iter().enumerate() {
            let mut seen_ports = Vec::new();
            for port in &range.monitor_ports {
                if port.port == 0 {
                    return Err(MonitorError::Config(format!(
                        "range {}: port 0 is not routable",
                        range_idx
                    )));
                }
                if seen_ports.contains(&port.port) {
                    // Duplicate ports would collide on the derived backend name.
                    return Err(MonitorError::Config(format!(
                        "range {}: port {} listed more than once",
                        range_idx, port.port
                    )));
                }
                seen_ports.push(port.port);

                if !port.path_prefix.is_empty() && !port.path_match.is_empty() {
                    warn!(
                        "range {} port {}: both path-prefix and path-match set, path-prefix wins",
                        range_idx, port.port
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{MonitorConfig, MonitorPort, MonitorRange};

    fn config_with_ports(ports: Vec<MonitorPort>) -> MonitorConfig {
        MonitorConfig {
            monitor_ranges: vec![MonitorRange {
                ip_address_start: "10.0.0.1".to_string(),
                ip_address_end: "10.0.0.8".to_string(),
                monitor_ports: ports,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = config_with_ports(vec![
            MonitorPort { port: 6443, path_match: "api".to_string(), ..Default::default() },
            MonitorPort { port: 443, path_prefix: "*.apps".to_string(), ..Default::default() },
        ]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = config_with_ports(vec![]);
        config.check_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_port_rejected() {
        let config = config_with_ports(vec![MonitorPort { port: 0, ..Default::default() }]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_port_rejected() {
        let config = config_with_ports(vec![
            MonitorPort { port: 443, ..Default::default() },
            MonitorPort { port: 443, ..Default::default() },
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unparseable_bounds_pass_validation() {
        // Malformed bounds are a scan-time condition, the sweep skips them.
        let mut config = config_with_ports(vec![MonitorPort { port: 443, ..Default::default() }]);
        config.monitor_ranges[0].ip_address_start = "not-an-address".to_string();
        assert!(config.validate().is_ok());
    }
}
