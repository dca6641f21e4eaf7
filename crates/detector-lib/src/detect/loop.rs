//! Continuous detection loop
//!
//! Runs the full enumerate -> evaluate -> report cycle on a fixed interval.
//! Shutdown is cooperative and takes effect between cycles; a sweep in
//! flight always finishes (evaluation is fast and synchronous).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, Instant};
use tracing::{info, warn};

use super::Detector;
use crate::observability::{DetectorMetrics, StructuredLogger};

/// Configuration for the detection loop
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Time between sweep starts (default: 5 minutes)
    pub interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

/// Periodically sweeps the cluster and reports detections
pub struct DetectionLoop {
    detector: Arc<Detector>,
    config: LoopConfig,
    metrics: DetectorMetrics,
    logger: StructuredLogger,
}

impl DetectionLoop {
    pub fn new(
        detector: Arc<Detector>,
        config: LoopConfig,
        metrics: DetectorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            detector,
            config,
            metrics,
            logger,
        }
    }

    /// Run sweeps until a shutdown signal arrives
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting detection loop"
        );

        let mut ticker = interval(self.config.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down detection loop");
                    break;
                }
            }
        }
    }

    async fn run_cycle(&self) {
        let start = Instant::now();

        match self.detector.sweep().await {
            Ok(summary) => {
                let elapsed = start.elapsed();
                self.metrics.observe_sweep_latency(elapsed.as_secs_f64());
                self.metrics.inc_sweeps();
                self.metrics
                    .set_containers_analyzed(summary.containers_analyzed as i64);
                self.metrics
                    .inc_zombies_detected(summary.detections.len() as u64);
                self.metrics
                    .inc_potential_zombies(summary.potential_count as u64);

                for detection in &summary.detections {
                    self.logger
                        .log_zombie(&detection.container, &detection.verdict);
                }
                self.logger.log_sweep_complete(
                    summary.containers_analyzed,
                    summary.detections.len(),
                    summary.potential_count,
                    elapsed.as_millis() as u64,
                );
            }
            Err(error) => {
                self.metrics.inc_provider_errors();
                warn!(error = %error, "Detection sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::SweepConfig;
    use crate::heuristics::HeuristicEngine;
    use crate::models::{ContainerRef, ResourceLimits, SeriesBundle};
    use crate::providers::{async_trait, LimitsProvider, SeriesProvider, WorkloadProvider};
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingWorkloads {
        sweeps: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WorkloadProvider for CountingWorkloads {
        async fn list_containers(&self) -> Result<Vec<ContainerRef>> {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn is_recently_created(&self, _namespace: &str, _pod: &str) -> Result<bool> {
            Ok(false)
        }
    }

    struct EmptySeries;

    #[async_trait]
    impl SeriesProvider for EmptySeries {
        async fn get_series(
            &self,
            _container: &ContainerRef,
            _window: Duration,
        ) -> Result<SeriesBundle> {
            Ok(SeriesBundle::default())
        }
    }

    struct UnknownLimits;

    #[async_trait]
    impl LimitsProvider for UnknownLimits {
        async fn get_limits(&self, _container: &ContainerRef) -> Result<ResourceLimits> {
            Ok(ResourceLimits::default())
        }
    }

    #[tokio::test]
    async fn test_loop_sweeps_and_stops_on_shutdown() {
        let sweeps = Arc::new(AtomicUsize::new(0));
        let detector = Arc::new(Detector::new(
            HeuristicEngine::default(),
            Arc::new(EmptySeries),
            Arc::new(UnknownLimits),
            Arc::new(CountingWorkloads {
                sweeps: sweeps.clone(),
            }),
            SweepConfig::default(),
        ));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let detection_loop = DetectionLoop::new(
            detector,
            LoopConfig {
                interval: Duration::from_millis(10),
            },
            DetectorMetrics::new(),
            StructuredLogger::new("test"),
        );

        let handle = tokio::spawn(detection_loop.run(shutdown_rx));

        // Let a few cycles run, then ask it to stop
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(sweeps.load(Ordering::SeqCst) >= 2);
    }
}
