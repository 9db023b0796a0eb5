//! Range scanning
//!
//! This module fans one range out into address x port probes with a bounded
//! in-flight budget, accumulates the results locally, and hands the caller a
//! complete picture at its join barrier. The shared aggregate is only touched
//! by the caller, under its lock, once the scan is whole.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::common::Result;
use crate::config::{defaults, MonitorRange};
use crate::scan::iprange::AddressRange;
use crate::scan::probe::{base_domain_from_sans, probe_port, ProbeOutcome};

/// Complete result of scanning one range.
///
/// `port_targets` is parallel to the range's `monitor_ports`.
#[derive(Debug, Clone)]
pub struct RangeScan {
    pub port_targets: Vec<Vec<String>>,
    pub base_domain: Option<String>,
}

impl RangeScan {
    /// A scan that found nothing, used for skipped ranges.
    pub fn empty(port_count: usize) -> Self {
        Self {
            port_targets: vec![Vec::new(); port_count],
            base_domain: None,
        }
    }

    /// Merge this scan into its range.
    ///
    /// Target lists are fully replaced, so targets absent from the current
    /// sweep are dropped. The base domain is only overwritten when this scan
    /// discovered one; an idle sweep keeps the previous domain.
    pub fn apply(self, range: &mut MonitorRange) {
        for (port, targets) in range.monitor_ports.iter_mut().zip(self.port_targets) {
            port.targets = targets;
        }
        if let Some(domain) = self.base_domain {
            range.base_domain = domain;
        }
    }
}

/// Scan every address x port pair of one range.
///
/// At most [`defaults::PROBE_WORKERS`] probes are in flight at a time,
/// regardless of range size.
///
/// # Returns
///
/// The accumulated scan, only after every scheduled probe has completed, so
/// the result is safe to merge immediately.
///
/// # Errors
///
/// Returns `InvalidRange` when the range bounds do not parse.
pub async fn scan_range(
    range: &MonitorRange,
    probe_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<RangeScan> {
    let bounds = AddressRange::parse(&range.ip_address_start, &range.ip_address_end)?;
    debug!(
        "scanning {}-{}: {} address(es), {} port(s)",
        range.ip_address_start,
        range.ip_address_end,
        bounds.len(),
        range.monitor_ports.len()
    );

    let budget = Arc::new(Semaphore::new(defaults::PROBE_WORKERS));
    let mut probes: JoinSet<(usize, Ipv4Addr, ProbeOutcome)> = JoinSet::new();

    'schedule: for address in &bounds {
        for (port_idx, port) in range.monitor_ports.iter().enumerate() {
            // Waiting on the budget is the backpressure point; a cancelled
            // sweep stops scheduling here and lets in-flight probes drain.
            let permit = tokio::select! {
                _ = cancel.cancelled() => break 'schedule,
                permit = Arc::clone(&budget).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break 'schedule,
                },
            };

            let port_number = port.port;
            let protocol = port.protocol;
            probes.spawn(async move {
                let outcome = probe_port(address, port_number, protocol, probe_timeout).await;
                drop(permit);
                (port_idx, address, outcome)
            });
        }
    }

    // Join barrier: every scheduled probe lands here before the caller can
    // observe the scan.
    let mut scan = RangeScan::empty(range.monitor_ports.len());
    while let Some(joined) = probes.join_next().await {
        let (port_idx, address, outcome) = match joined {
            Ok(result) => result,
            Err(e) => {
                error!("probe task failed: {}", e);
                continue;
            }
        };
        if !outcome.reachable {
            continue;
        }
        scan.port_targets[port_idx].push(address.to_string());

        if let Some(prefix) = range.monitor_ports[port_idx].match_prefix() {
            // Last completed probe wins; legitimate targets of one range
            // present the same domain.
            if let Some(domain) = base_domain_from_sans(&outcome.san_names, prefix) {
                info!("found base domain {}", domain);
                scan.base_domain = Some(domain);
            }
        }
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorPort;

    fn range(start: &str, end: &str, ports: Vec<MonitorPort>) -> MonitorRange {
        MonitorRange {
            ip_address_start: start.to_string(),
            ip_address_end: end.to_string(),
            monitor_ports: ports,
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_replaces_targets() {
        let mut target_range = range(
            "10.0.0.1",
            "10.0.0.8",
            vec![MonitorPort {
                port: 443,
                targets: vec!["10.0.0.3".to_string(), "10.0.0.4".to_string()],
                ..Default::default()
            }],
        );
        target_range.base_domain = "old.example.com".to_string();

        let scan = RangeScan {
            port_targets: vec![vec!["10.0.0.5".to_string()]],
            base_domain: None,
        };
        scan.apply(&mut target_range);

        // Full replace: the previously discovered targets are gone.
        assert_eq!(target_range.monitor_ports[0].targets, vec!["10.0.0.5".to_string()]);
        // No domain discovered this sweep: the previous one sticks.
        assert_eq!(target_range.base_domain, "old.example.com");
    }

    #[test]
    fn test_apply_empty_scan_clears_targets() {
        let mut target_range = range(
            "10.0.0.1",
            "10.0.0.8",
            vec![MonitorPort {
                port: 443,
                targets: vec!["10.0.0.3".to_string()],
                ..Default::default()
            }],
        );
        RangeScan::empty(1).apply(&mut target_range);
        assert!(target_range.monitor_ports[0].targets.is_empty());
    }

    #[test]
    fn test_apply_overwrites_discovered_domain() {
        let mut target_range = range("10.0.0.1", "10.0.0.1", vec![MonitorPort::default()]);
        target_range.base_domain = "old.example.com".to_string();

        let scan = RangeScan {
            port_targets: vec![Vec::new()],
            base_domain: Some("new.example.com".to_string()),
        };
        scan.apply(&mut target_range);
        assert_eq!(target_range.base_domain, "new.example.com");
    }

    #[tokio::test]
    async fn test_invalid_bounds_fail_the_scan() {
        let bad = range("10.0.0.9", "10.0.0.1", vec![MonitorPort::default()]);
        let cancel = CancellationToken::new();
        let result = scan_range(&bad, Duration::from_millis(100), &cancel).await;
        assert!(matches!(
            result,
            Err(crate::common::MonitorError::InvalidRange(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_scan_returns_partial_results() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let scanned = range(
            "127.0.0.1",
            "127.0.0.32",
            vec![MonitorPort { port: 1, ..Default::default() }],
        );
        let scan = scan_range(&scanned, Duration::from_millis(100), &cancel)
            .await
            .expect("cancelled scan still completes");
        // The scan returns a well-formed (empty) result instead of hanging.
        assert_eq!(scan.port_targets.len(), 1);
        assert!(scan.port_targets[0].is_empty());
    }
}
