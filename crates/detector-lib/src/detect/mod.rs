//! Detection orchestration
//!
//! Walks the cluster's workload containers, fetches their series and limits,
//! runs the heuristic engine on each, and keeps the ones scoring at or above
//! the configured threshold. One misbehaving container (or a failed fetch
//! for it) never aborts the rest of the sweep.

mod r#loop;

pub use r#loop::{DetectionLoop, LoopConfig};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::heuristics::HeuristicEngine;
use crate::models::{
    ContainerRef, Detection, ResourceLimits, SeriesBundle, Verdict, POTENTIAL_ZOMBIE_SCORE,
};
use crate::providers::{LimitsProvider, SeriesProvider, WorkloadProvider};

/// Default analysis window for a sweep
const DEFAULT_WINDOW_MINUTES: u64 = 60;

/// Sweep-level settings, fixed for the detector's lifetime
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Composite score required to report a container
    pub score_threshold: f64,
    /// Namespaces never analyzed
    pub exclude_namespaces: Vec<String>,
    /// Trailing metrics window fetched per container
    pub window: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            score_threshold: 70.0,
            exclude_namespaces: vec!["kube-system".to_string(), "monitoring".to_string()],
            window: Duration::from_secs(DEFAULT_WINDOW_MINUTES * 60),
        }
    }
}

/// Result of one full detection sweep
#[derive(Debug)]
pub struct SweepSummary {
    /// Containers at or above the score threshold, in enumeration order
    pub detections: Vec<Detection>,
    /// Containers actually analyzed (after exclusion and age filters)
    pub containers_analyzed: usize,
    /// Containers scoring in the potential band but below the threshold
    pub potential_count: usize,
}

/// Runs detection sweeps against a set of providers
pub struct Detector {
    engine: HeuristicEngine,
    series: Arc<dyn SeriesProvider>,
    limits: Arc<dyn LimitsProvider>,
    workloads: Arc<dyn WorkloadProvider>,
    config: SweepConfig,
}

impl Detector {
    pub fn new(
        engine: HeuristicEngine,
        series: Arc<dyn SeriesProvider>,
        limits: Arc<dyn LimitsProvider>,
        workloads: Arc<dyn WorkloadProvider>,
        config: SweepConfig,
    ) -> Self {
        Self {
            engine,
            series,
            limits,
            workloads,
            config,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Analyze every eligible container and collect those at or above the
    /// score threshold
    ///
    /// Fails only when enumeration itself fails; per-container fetch errors
    /// degrade to empty data for that container.
    pub async fn sweep(&self) -> Result<SweepSummary> {
        let containers = self
            .workloads
            .list_containers()
            .await
            .context("Failed to enumerate containers")?;
        info!(count = containers.len(), "Starting detection sweep");

        let mut detections = Vec::new();
        let mut analyzed = 0usize;
        let mut potential = 0usize;

        for container in containers {
            if self
                .config
                .exclude_namespaces
                .iter()
                .any(|ns| ns == &container.namespace)
            {
                debug!(container = %container, "Skipping excluded namespace");
                continue;
            }

            match self
                .workloads
                .is_recently_created(&container.namespace, &container.pod)
                .await
            {
                Ok(true) => {
                    debug!(container = %container, "Skipping recently created container");
                    continue;
                }
                Ok(false) => {}
                Err(error) => {
                    // Age unknown: analyze rather than silently skip
                    warn!(container = %container, error = %error, "Failed to check container age");
                }
            }

            let verdict = self.analyze(&container, self.config.window).await;
            analyzed += 1;

            if verdict.composite_score >= self.config.score_threshold {
                info!(
                    container = %container,
                    score = verdict.composite_score,
                    "Zombie container detected"
                );
                detections.push(Detection {
                    container,
                    verdict,
                });
            } else if verdict.composite_score >= POTENTIAL_ZOMBIE_SCORE {
                potential += 1;
                info!(
                    container = %container,
                    score = verdict.composite_score,
                    "Potential zombie container"
                );
            }
        }

        Ok(SweepSummary {
            detections,
            containers_analyzed: analyzed,
            potential_count: potential,
        })
    }

    /// Detailed analysis of a single container over an arbitrary window
    pub async fn inspect(&self, container: &ContainerRef, window: Duration) -> Detection {
        let verdict = self.analyze(container, window).await;
        Detection {
            container: container.clone(),
            verdict,
        }
    }

    /// Fetch series and limits for one container and score it
    ///
    /// Provider failures degrade to empty data so the rules disqualify
    /// themselves instead of the call erroring out.
    async fn analyze(&self, container: &ContainerRef, window: Duration) -> Verdict {
        let bundle = match self.series.get_series(container, window).await {
            Ok(bundle) => bundle,
            Err(error) => {
                warn!(container = %container, error = %error, "Series fetch failed, treating as no data");
                SeriesBundle::default()
            }
        };

        let limits = match self.limits.get_limits(container).await {
            Ok(limits) => limits,
            Err(error) => {
                warn!(container = %container, error = %error, "Limits fetch failed, treating as unknown");
                ResourceLimits::default()
            }
        };

        self.engine.analyze(&bundle, &limits)
    }
}
