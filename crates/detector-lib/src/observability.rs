//! Observability infrastructure for the detector
//!
//! Provides:
//! - Prometheus metrics (sweep latency, analysis counts, detections)
//! - Structured JSON logging with tracing for detection events

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::models::{ContainerRef, Verdict};

/// Histogram buckets for sweep latency (in seconds)
const SWEEP_LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DetectorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct DetectorMetricsInner {
    sweep_latency_seconds: Histogram,
    sweeps_total: IntCounter,
    containers_analyzed: IntGauge,
    zombies_detected_total: IntCounter,
    potential_zombies_total: IntCounter,
    provider_errors_total: IntCounter,
}

impl DetectorMetricsInner {
    fn new() -> Self {
        Self {
            sweep_latency_seconds: register_histogram!(
                "zombie_detector_sweep_latency_seconds",
                "Time spent running a full detection sweep",
                SWEEP_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register sweep_latency_seconds"),

            sweeps_total: register_int_counter!(
                "zombie_detector_sweeps_total",
                "Total number of detection sweeps completed"
            )
            .expect("Failed to register sweeps_total"),

            containers_analyzed: register_int_gauge!(
                "zombie_detector_containers_analyzed",
                "Containers analyzed during the most recent sweep"
            )
            .expect("Failed to register containers_analyzed"),

            zombies_detected_total: register_int_counter!(
                "zombie_detector_zombies_detected_total",
                "Total number of zombie detections reported"
            )
            .expect("Failed to register zombies_detected_total"),

            potential_zombies_total: register_int_counter!(
                "zombie_detector_potential_zombies_total",
                "Total number of containers scoring in the potential band"
            )
            .expect("Failed to register potential_zombies_total"),

            provider_errors_total: register_int_counter!(
                "zombie_detector_provider_errors_total",
                "Total number of collaborator (metrics/cluster) failures"
            )
            .expect("Failed to register provider_errors_total"),
        }
    }
}

/// Detector metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct DetectorMetrics {
    _private: (),
}

impl Default for DetectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DetectorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DetectorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record how long a sweep took
    pub fn observe_sweep_latency(&self, duration_secs: f64) {
        self.inner().sweep_latency_seconds.observe(duration_secs);
    }

    pub fn inc_sweeps(&self) {
        self.inner().sweeps_total.inc();
    }

    /// Record how many containers the latest sweep analyzed
    pub fn set_containers_analyzed(&self, count: i64) {
        self.inner().containers_analyzed.set(count);
    }

    pub fn inc_zombies_detected(&self, count: u64) {
        self.inner().zombies_detected_total.inc_by(count);
    }

    pub fn inc_potential_zombies(&self, count: u64) {
        self.inner().potential_zombies_total.inc_by(count);
    }

    pub fn inc_provider_errors(&self) {
        self.inner().provider_errors_total.inc();
    }
}

/// Structured logger for detection events
///
/// Provides consistent JSON-formatted logging for sweeps and verdicts.
#[derive(Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Log a zombie detection event
    pub fn log_zombie(&self, container: &ContainerRef, verdict: &Verdict) {
        warn!(
            event = "zombie_detected",
            component = %self.component,
            namespace = %container.namespace,
            pod = %container.pod,
            container = %container.container,
            node = %container.node,
            score = verdict.composite_score,
            classification = %verdict.classification,
            "Zombie container detected"
        );
    }

    /// Log completion of a detection sweep
    pub fn log_sweep_complete(
        &self,
        analyzed: usize,
        zombies: usize,
        potential: usize,
        elapsed_ms: u64,
    ) {
        info!(
            event = "sweep_complete",
            component = %self.component,
            containers_analyzed = analyzed,
            zombies = zombies,
            potential_zombies = potential,
            elapsed_ms = elapsed_ms,
            "Detection sweep complete"
        );
    }

    /// Log detector startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "detector_started",
            component = %self.component,
            version = %version,
            "Zombie detector started"
        );
    }

    /// Log detector shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "detector_shutdown",
            component = %self.component,
            reason = %reason,
            "Zombie detector shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_metrics_creation() {
        // Metrics live in the process-wide Prometheus registry; exercise the
        // handle methods rather than asserting on registry contents.
        let metrics = DetectorMetrics::new();

        metrics.observe_sweep_latency(0.05);
        metrics.inc_sweeps();
        metrics.set_containers_analyzed(12);
        metrics.inc_zombies_detected(2);
        metrics.inc_potential_zombies(1);
        metrics.inc_provider_errors();
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-detector");
        assert_eq!(logger.component, "test-detector");
    }
}
