//! Discovery sweep
//!
//! One sweep scans every configured range with a coarse concurrency bound and
//! merges each range's results into the shared aggregate as its scan
//! completes. A malformed range is logged and yields empty targets; it never
//! aborts discovery for the others.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{defaults, SharedMonitorConfig};
use crate::scan::scanner::{scan_range, RangeScan};

/// Sweep all configured ranges.
///
/// At most [`defaults::RANGE_WORKERS`] ranges are scanned concurrently.
/// Returns only after every range has completed and merged, so callers can
/// synthesize from the aggregate immediately. Cancellation stops scheduling
/// new work; scans already in flight finish or time out naturally and their
/// partial results are still merged.
pub async fn run_sweep(shared: &SharedMonitorConfig, cancel: &CancellationToken) {
    let (ranges, probe_timeout) = {
        let config = shared.lock().unwrap();
        (
            config.monitor_ranges.clone(),
            Duration::from_millis(config.check_timeout),
        )
    };
    if ranges.is_empty() {
        debug!("no ranges configured, nothing to sweep");
        return;
    }

    let budget = Arc::new(Semaphore::new(defaults::RANGE_WORKERS));
    let mut scans: JoinSet<(usize, RangeScan)> = JoinSet::new();

    for (range_idx, range) in ranges.into_iter().enumerate() {
        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&budget).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let cancel = cancel.clone();
        scans.spawn(async move {
            let port_count = range.monitor_ports.len();
            let scan = match scan_range(&range, probe_timeout, &cancel).await {
                Ok(scan) => scan,
                Err(e) => {
                    // Liveness: a malformed range is skipped for this cycle.
                    warn!(
                        "skipping range {}-{}: {}",
                        range.ip_address_start, range.ip_address_end, e
                    );
                    RangeScan::empty(port_count)
                }
            };
            drop(permit);
            (range_idx, scan)
        });
    }

    while let Some(joined) = scans.join_next().await {
        match joined {
            Ok((range_idx, scan)) => {
                let mut config = shared.lock().unwrap();
                if let Some(range) = config.monitor_ranges.get_mut(range_idx) {
                    scan.apply(range);
                }
            }
            Err(e) => error!("range scan task failed: {}", e),
        }
    }
}
