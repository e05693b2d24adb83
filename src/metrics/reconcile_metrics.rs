//! Reconciliation metrics using OpenTelemetry.

use crate::domain::Domain;
use crate::model::PeerCategory;
use crate::reconcile::PeerDiff;
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::time::Instant;

/// Metrics collector for domain reloads.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_reconcile::domain::Domain;
/// use hotswap_reconcile::metrics::ReconcileMetrics;
/// use opentelemetry::global;
///
/// let metrics = ReconcileMetrics::new(global::meter("hotswap-reconcile"));
///
/// let timer = metrics.start_reload(Domain::AgentPeers);
/// // ... perform reload ...
/// metrics.record_reload_success(Domain::AgentPeers, timer);
/// ```
#[derive(Clone)]
pub struct ReconcileMetrics {
    reload_attempts: Counter<u64>,
    reload_success: Counter<u64>,
    reload_failures: Counter<u64>,
    reload_faults: Counter<u64>,
    reload_duration: Histogram<f64>,
    peers_added: Counter<u64>,
    peers_removed: Counter<u64>,
    http_transitions: Counter<u64>,
    config_age_seconds: Gauge<i64>,
    last_update: Arc<parking_lot::Mutex<Instant>>,
}

fn domain_attr(domain: Domain) -> [KeyValue; 1] {
    [KeyValue::new("domain", domain.as_str())]
}

impl ReconcileMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let reload_attempts = meter
            .u64_counter("hotswap_reconcile.reload.attempts")
            .with_description("Total number of domain reload attempts")
            .build();

        let reload_success = meter
            .u64_counter("hotswap_reconcile.reload.success")
            .with_description("Number of domain reloads that applied cleanly")
            .build();

        let reload_failures = meter
            .u64_counter("hotswap_reconcile.reload.failures")
            .with_description("Number of domain reloads that reported an error")
            .build();

        let reload_faults = meter
            .u64_counter("hotswap_reconcile.reload.faults")
            .with_description("Number of domain reloads aborted by an internal fault")
            .build();

        let reload_duration = meter
            .f64_histogram("hotswap_reconcile.reload.duration")
            .with_description("Duration of domain reloads in seconds")
            .with_unit("s")
            .build();

        let peers_added = meter
            .u64_counter("hotswap_reconcile.peers.added")
            .with_description("Peers newly registered in the device registry")
            .build();

        let peers_removed = meter
            .u64_counter("hotswap_reconcile.peers.removed")
            .with_description("Peers removed from the device registry")
            .build();

        let http_transitions = meter
            .u64_counter("hotswap_reconcile.http.transitions")
            .with_description("HTTP front-end starts and stops")
            .build();

        let config_age_seconds = meter
            .i64_gauge("hotswap_reconcile.age")
            .with_description("Time since the last successful reload in seconds")
            .with_unit("s")
            .build();

        Self {
            reload_attempts,
            reload_success,
            reload_failures,
            reload_faults,
            reload_duration,
            peers_added,
            peers_removed,
            http_transitions,
            config_age_seconds,
            last_update: Arc::new(parking_lot::Mutex::new(Instant::now())),
        }
    }

    /// Count a reload attempt and start its timer.
    pub fn start_reload(&self, domain: Domain) -> Instant {
        self.reload_attempts.add(1, &domain_attr(domain));
        Instant::now()
    }

    /// Record a reload that applied without error.
    pub fn record_reload_success(&self, domain: Domain, start: Instant) {
        let attrs = domain_attr(domain);
        self.reload_success.add(1, &attrs);
        self.reload_duration.record(start.elapsed().as_secs_f64(), &attrs);
        *self.last_update.lock() = Instant::now();
    }

    /// Record a reload that returned an error.
    pub fn record_reload_failure(&self, domain: Domain, start: Instant) {
        let attrs = domain_attr(domain);
        self.reload_failures.add(1, &attrs);
        self.reload_duration.record(start.elapsed().as_secs_f64(), &attrs);
    }

    /// Record a reload aborted by a panic.
    pub fn record_reload_fault(&self, domain: Domain) {
        self.reload_faults.add(1, &domain_attr(domain));
    }

    /// Record the registry operations of one peer reconciliation.
    pub fn record_peer_diff(&self, category: PeerCategory, diff: &PeerDiff) {
        let attrs = [KeyValue::new("category", category.as_str())];
        self.peers_added.add(diff.added.len() as u64, &attrs);
        self.peers_removed.add(diff.removed.len() as u64, &attrs);
    }

    /// Record an HTTP front-end start (`true`) or stop (`false`).
    pub fn record_http_transition(&self, started: bool) {
        let action = if started { "start" } else { "stop" };
        self.http_transitions
            .add(1, &[KeyValue::new("action", action)]);
    }

    /// Publish the time since the last successful reload.
    pub fn update_config_age(&self) {
        let age_secs = self.last_update.lock().elapsed().as_secs() as i64;
        self.config_age_seconds.record(age_secs, &[]);
    }
}

impl std::fmt::Debug for ReconcileMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileMetrics").finish_non_exhaustive()
    }
}
