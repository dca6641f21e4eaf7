//! Kubernetes-backed workload enumeration
//!
//! Lists pods across all namespaces and expands them to per-container refs.
//! Pods can opt out of detection with the `zombie-detection.exclude=true`
//! label; pods younger than the recent-age floor are reported as recently
//! created so sweeps skip their warm-up noise.

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::{api::ListParams, Api, Client};
use tracing::debug;

use super::{async_trait, WorkloadProvider};
use crate::models::ContainerRef;

/// Pod label that opts a workload out of detection
const EXCLUDE_LABEL: &str = "zombie-detection.exclude";

/// Pods younger than this are considered recently created (seconds)
const RECENT_AGE_SECS: i64 = 600;

/// Workload provider backed by the Kubernetes API
pub struct KubeWorkloads {
    client: Client,
}

impl KubeWorkloads {
    /// Connect using in-cluster configuration, falling back to kubeconfig
    pub async fn new() -> Result<Self> {
        let client = Client::try_default()
            .await
            .context("Failed to load Kubernetes configuration")?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkloadProvider for KubeWorkloads {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let list = pods
            .list(&ListParams::default())
            .await
            .context("Failed to list pods")?;

        let mut containers = Vec::new();
        for pod in list {
            let Some(metadata_name) = pod.metadata.name.clone() else {
                continue;
            };
            let namespace = pod.metadata.namespace.clone().unwrap_or_default();

            let excluded = pod
                .metadata
                .labels
                .as_ref()
                .and_then(|labels| labels.get(EXCLUDE_LABEL))
                .is_some_and(|value| value == "true");
            if excluded {
                debug!(pod = %metadata_name, namespace = %namespace, "Pod opted out of detection");
                continue;
            }

            let Some(spec) = pod.spec else {
                continue;
            };
            let node = spec.node_name.unwrap_or_default();

            for container in spec.containers {
                containers.push(ContainerRef {
                    namespace: namespace.clone(),
                    pod: metadata_name.clone(),
                    container: container.name,
                    node: node.clone(),
                });
            }
        }

        Ok(containers)
    }

    async fn is_recently_created(&self, namespace: &str, pod: &str) -> Result<bool> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods
            .get(pod)
            .await
            .with_context(|| format!("Failed to read pod {namespace}/{pod}"))?;

        let Some(start_time) = pod.status.and_then(|s| s.start_time) else {
            return Ok(false);
        };

        let age_secs = chrono::Utc::now().timestamp() - start_time.0.timestamp();
        Ok(age_secs < RECENT_AGE_SECS)
    }
}
