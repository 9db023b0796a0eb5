//! Change detection
//!
//! The fingerprint gate decides whether a rendered configuration needs to be
//! pushed to the sink. A change in the set of routable base domains (ranges
//! appearing or disappearing) short-circuits to `Changed`; otherwise the
//! byte-level fingerprint comparison is authoritative. The stored state only
//! advances on a confirmed successful apply, so a failed apply retries on the
//! next cycle with the same fingerprint.

use std::collections::BTreeSet;

use log::debug;

use crate::haproxy::synth::RenderedConfig;

/// Outcome of a gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The configuration differs from the last applied one; push it.
    Changed,
    /// Byte-identical to the last applied configuration; skip the apply.
    Unchanged,
}

/// Tracks the last successfully applied configuration for one sink.
#[derive(Debug, Default)]
pub struct FingerprintGate {
    applied_fingerprint: Option<String>,
    applied_domains: BTreeSet<String>,
}

impl FingerprintGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `rendered` must be applied.
    ///
    /// Pure with respect to the gate state; record the apply separately with
    /// [`record_applied`](Self::record_applied) once the sink confirms it.
    pub fn evaluate(&self, rendered: &RenderedConfig) -> GateDecision {
        if rendered.base_domains != self.applied_domains {
            debug!(
                "active base domains changed: {:?} -> {:?}",
                self.applied_domains, rendered.base_domains
            );
            return GateDecision::Changed;
        }
        match &self.applied_fingerprint {
            Some(applied) if *applied == rendered.fingerprint => GateDecision::Unchanged,
            _ => GateDecision::Changed,
        }
    }

    /// Record a confirmed successful apply of `rendered`.
    pub fn record_applied(&mut self, rendered: &RenderedConfig) {
        self.applied_fingerprint = Some(rendered.fingerprint.clone());
        self.applied_domains = rendered.base_domains.clone();
    }

    /// Fingerprint of the last successful apply, if any
    pub fn applied_fingerprint(&self) -> Option<&str> {
        self.applied_fingerprint.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MonitorConfig, MonitorPort, MonitorRange};
    use crate::haproxy::render;

    fn sample_config(domain: &str, targets: &[&str]) -> MonitorConfig {
        MonitorConfig {
            haproxy_header: "test-header\n".to_string(),
            monitor_ranges: vec![MonitorRange {
                base_domain: domain.to_string(),
                monitor_ports: vec![MonitorPort {
                    port: 6443,
                    path_match: "api".to_string(),
                    targets: targets.iter().map(|t| t.to_string()).collect(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_first_evaluation_is_changed() {
        let gate = FingerprintGate::new();
        let rendered = render(&sample_config("test-domain", &["192.168.1.4"]));
        assert_eq!(gate.evaluate(&rendered), GateDecision::Changed);
    }

    #[test]
    fn test_unchanged_after_apply() {
        let mut gate = FingerprintGate::new();
        let rendered = render(&sample_config("test-domain", &["192.168.1.4"]));

        gate.record_applied(&rendered);
        assert_eq!(gate.evaluate(&rendered), GateDecision::Unchanged);

        // Re-rendering unchanged input must stay unchanged.
        let rerendered = render(&sample_config("test-domain", &["192.168.1.4"]));
        assert_eq!(gate.evaluate(&rerendered), GateDecision::Unchanged);
    }

    #[test]
    fn test_target_mutation_is_changed() {
        let mut gate = FingerprintGate::new();
        let rendered = render(&sample_config("test-domain", &["192.168.1.4"]));
        gate.record_applied(&rendered);

        // Same domain set, different bytes: caught by the hash check.
        let mutated = render(&sample_config("test-domain", &["192.168.1.4", "192.168.1.5"]));
        assert_eq!(gate.evaluate(&mutated), GateDecision::Changed);
    }

    #[test]
    fn test_domain_set_change_short_circuits() {
        let mut gate = FingerprintGate::new();
        let rendered = render(&sample_config("test-domain", &["192.168.1.4"]));
        gate.record_applied(&rendered);

        let moved = render(&sample_config("other-domain", &["192.168.1.4"]));
        assert_eq!(gate.evaluate(&moved), GateDecision::Changed);

        // A range losing all targets drops out of the active set.
        let emptied = render(&sample_config("test-domain", &[]));
        assert_eq!(gate.evaluate(&emptied), GateDecision::Changed);
    }

    #[test]
    fn test_failed_apply_keeps_retrying() {
        let mut gate = FingerprintGate::new();
        let rendered = render(&sample_config("test-domain", &["192.168.1.4"]));

        // evaluate() without record_applied(): the sink apply failed, the
        // stored digest must not advance.
        assert_eq!(gate.evaluate(&rendered), GateDecision::Changed);
        assert_eq!(gate.evaluate(&rendered), GateDecision::Changed);
        assert!(gate.applied_fingerprint().is_none());

        gate.record_applied(&rendered);
        assert_eq!(gate.evaluate(&rendered), GateDecision::Unchanged);
        assert_eq!(gate.applied_fingerprint(), Some(rendered.fingerprint.as_str()));
    }
}
