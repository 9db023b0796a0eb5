//! HAProxy Autoconf command line tool
//!
//! Runs the reconcile loop: discover targets (by scanning ranges or by
//! consulting the control-plane tenant directory), synthesize the HAProxy
//! configuration, and apply it through the sink when the fingerprint gate
//! reports a change.

use clap::Parser;
use log::{debug, error, info};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use haproxy_autoconf::common::init_logger;
use haproxy_autoconf::config::{defaults, MonitorConfig};
use haproxy_autoconf::haproxy::{render, FingerprintGate, GateDecision};
use haproxy_autoconf::scan::run_sweep;
use haproxy_autoconf::sink::{ConfigSink, FileReloadSink};
use haproxy_autoconf::tenants::{refresh_from_directory, FileTenantDirectory};
use haproxy_autoconf::{Result, APP_NAME, VERSION};
use tokio_util::sync::CancellationToken;

/// Dynamic HAProxy configuration from live endpoint discovery
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Monitor configuration file
    #[clap(short, long, default_value = defaults::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Where the generated configuration is written
    #[clap(short, long, default_value = defaults::DEFAULT_OUTPUT_FILE)]
    output: String,

    /// Command run after a successful write; empty string disables reloads
    #[clap(long, default_value = defaults::DEFAULT_RELOAD_COMMAND)]
    reload_command: String,

    /// Tenant directory file, consulted when control-plane-enable is set
    #[clap(long, default_value = "tenant-targets.json")]
    tenant_targets: String,

    /// Seconds between reconcile cycles
    #[clap(long, default_value_t = defaults::interval_secs())]
    interval: u64,

    /// Run a single reconcile cycle and exit
    #[clap(long)]
    once: bool,

    /// Log level
    #[clap(long, default_value = defaults::LOG_LEVEL_STR)]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);

    info!("Starting {} v{}", APP_NAME, VERSION);

    let config = MonitorConfig::load(&args.config)?;
    let control_plane = config.control_plane_enable;
    if control_plane {
        info!("control-plane discovery enabled, ranges come from {}", args.tenant_targets);
    }
    let shared = Arc::new(Mutex::new(config));

    let directory = FileTenantDirectory::new(&args.tenant_targets);
    let sink = FileReloadSink::new(&args.output, &args.reload_command);
    let mut gate = FingerprintGate::new();

    // A cancelled cycle stops scheduling probes and finishes the loop body,
    // so a partial sweep still produces a valid configuration.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                cancel.cancel();
            }
        });
    }

    loop {
        if control_plane {
            if let Err(e) = refresh_from_directory(&shared, &directory).await {
                // Keep the previous ranges; stale targets beat empty frontends.
                error!("tenant directory refresh failed: {}", e);
            }
        } else {
            run_sweep(&shared, &cancel).await;
        }

        let rendered = {
            let config = shared.lock().unwrap();
            render(&config)
        };

        match gate.evaluate(&rendered) {
            GateDecision::Unchanged => {
                debug!("configuration unchanged, skipping apply");
            }
            GateDecision::Changed => match sink.apply(&rendered.text, &rendered.fingerprint).await {
                Ok(()) => {
                    info!("configuration applied");
                    gate.record_applied(&rendered);
                }
                Err(e) => {
                    // The gate did not advance; next cycle retries the same
                    // fingerprint.
                    error!("apply failed: {}", e);
                }
            },
        }

        if args.once || cancel.is_cancelled() {
            break;
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(args.interval)) => {}
        }
    }

    Ok(())
}
