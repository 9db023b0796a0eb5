//! Configuration loading functionality
//!
//! Loads the monitor configuration from its YAML file and folds in the
//! optional subnet catalog. The core only ever sees the already-parsed value
//! objects.

use std::path::Path;

use log::{debug, info};

use crate::common::{MonitorError, Result};
use crate::config::{subnets, MonitorConfig, MonitorConfigSpec};

impl MonitorConfig {
    /// Load and validate the monitor configuration.
    ///
    /// Reads the `monitor-config:` document at `path`, appends ranges from
    /// the subnet catalog when `subnets-file` is set, and validates the
    /// result.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("loading monitor configuration from {}", path.display());

        let spec: MonitorConfigSpec = config::Config::builder()
            .add_source(config::File::new(
                path.to_str().ok_or_else(|| {
                    MonitorError::Config(format!("Non-UTF-8 config path: {}", path.display()))
                })?,
                config::FileFormat::Yaml,
            ))
            .build()
            .map_err(|e| {
                MonitorError::Config(format!("Failed to read {}: {}", path.display(), e))
            })?
            .try_deserialize()
            .map_err(|e| {
                MonitorError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?;

        let mut monitor_config = spec.monitor_config;

        if let Some(subnets_file) = monitor_config.subnets_file.clone() {
            let ranges = subnets::ranges_from_subnets_file(&subnets_file)?;
            info!(
                "appending {} range(s) from subnet catalog {}",
                ranges.len(),
                subnets_file.display()
            );
            monitor_config.monitor_ranges.extend(ranges);
        }

        monitor_config.validate()?;
        debug!(
            "configuration loaded: {} range(s), check timeout {}ms",
            monitor_config.monitor_ranges.len(),
            monitor_config.check_timeout
        );
        Ok(monitor_config)
    }
}
