//! Collaborator interfaces for metrics and workload enumeration
//!
//! The scoring engine never performs I/O itself; everything it consumes
//! arrives through these traits. Implementations may fail per call — the
//! orchestrator degrades a failed fetch to "no data" for that container.

mod kube;
mod prometheus;

pub use kube::KubeWorkloads;
pub use prometheus::PrometheusProvider;

use crate::models::{ContainerRef, ResourceLimits, SeriesBundle};
use anyhow::Result;
use std::time::Duration;

pub use async_trait::async_trait;

/// Supplies time-ordered metric series for a container
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Fetch the four metric channels covering the trailing `window`
    ///
    /// Individual series may come back empty when the backend has no data.
    async fn get_series(&self, container: &ContainerRef, window: Duration)
        -> Result<SeriesBundle>;
}

/// Supplies configured resource limits for a container
#[async_trait]
pub trait LimitsProvider: Send + Sync {
    /// Zero-valued fields mean the limit is unknown
    async fn get_limits(&self, container: &ContainerRef) -> Result<ResourceLimits>;
}

/// Enumerates workload containers and answers lifecycle questions
#[async_trait]
pub trait WorkloadProvider: Send + Sync {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>>;

    /// Whether the owning pod started less than the recent-age floor ago
    async fn is_recently_created(&self, namespace: &str, pod: &str) -> Result<bool>;
}
