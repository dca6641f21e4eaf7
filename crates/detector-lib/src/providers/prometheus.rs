//! Prometheus-backed series and limits provider
//!
//! Queries the Prometheus HTTP API for per-container usage rates and
//! configured limits. Range queries use a 15-second step; CPU and network
//! values arrive as 5-minute rates, memory as absolute bytes.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use url::Url;

use super::{async_trait, LimitsProvider, SeriesProvider};
use crate::models::{ContainerRef, ResourceLimits, Sample, Series, SeriesBundle};

/// Query resolution for range queries
const QUERY_STEP: &str = "15s";

/// CPU quota is reported in microseconds per 100ms period
const CPU_QUOTA_PER_CORE: f64 = 100_000.0;

/// Client for the Prometheus query API
pub struct PrometheusProvider {
    client: Client,
    api_url: Url,
}

impl PrometheusProvider {
    /// Create a provider against a Prometheus base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base = Url::parse(base_url).context("Invalid Prometheus URL")?;
        let api_url = base.join("api/v1/").context("Invalid Prometheus URL")?;

        Ok(Self { client, api_url })
    }

    /// Execute an instant query
    async fn query(&self, query: &str) -> Result<QueryResponse> {
        let url = self.api_url.join("query").context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .query(&[("query", query)])
            .send()
            .await
            .context("Failed to query Prometheus")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Prometheus error ({}): {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Prometheus response")
    }

    /// Execute a range query over `[start, end]` seconds
    async fn query_range(&self, query: &str, start: i64, end: i64) -> Result<QueryResponse> {
        let url = self.api_url.join("query_range").context("Invalid path")?;
        let start = start.to_string();
        let end = end.to_string();

        let response = self
            .client
            .get(url)
            .query(&[
                ("query", query),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("step", QUERY_STEP),
            ])
            .send()
            .await
            .context("Failed to query Prometheus range")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Prometheus error ({}): {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Prometheus response")
    }

    async fn fetch_series(&self, query: &str, start: i64, end: i64) -> Result<Series> {
        let response = self.query_range(query, start, end).await?;
        Ok(response.into_series())
    }

    async fn fetch_scalar(&self, query: &str) -> Result<Option<f64>> {
        let response = self.query(query).await?;
        Ok(response.into_scalar())
    }
}

#[async_trait]
impl SeriesProvider for PrometheusProvider {
    async fn get_series(
        &self,
        container: &ContainerRef,
        window: Duration,
    ) -> Result<SeriesBundle> {
        let end = chrono::Utc::now().timestamp();
        let start = end - window.as_secs() as i64;

        let cpu_query = format!(
            r#"rate(container_cpu_usage_seconds_total{{namespace="{}", pod="{}", container="{}"}}[5m])"#,
            container.namespace, container.pod, container.container
        );
        let memory_query = format!(
            r#"container_memory_usage_bytes{{namespace="{}", pod="{}", container="{}"}}"#,
            container.namespace, container.pod, container.container
        );
        let rx_query = format!(
            r#"rate(container_network_receive_bytes_total{{namespace="{}", pod="{}"}}[5m])"#,
            container.namespace, container.pod
        );
        let tx_query = format!(
            r#"rate(container_network_transmit_bytes_total{{namespace="{}", pod="{}"}}[5m])"#,
            container.namespace, container.pod
        );

        Ok(SeriesBundle {
            cpu: self.fetch_series(&cpu_query, start, end).await?,
            memory: self.fetch_series(&memory_query, start, end).await?,
            network_rx: self.fetch_series(&rx_query, start, end).await?,
            network_tx: self.fetch_series(&tx_query, start, end).await?,
        })
    }
}

#[async_trait]
impl LimitsProvider for PrometheusProvider {
    async fn get_limits(&self, container: &ContainerRef) -> Result<ResourceLimits> {
        let cpu_query = format!(
            r#"container_spec_cpu_quota{{namespace="{}", pod="{}", container="{}"}}"#,
            container.namespace, container.pod, container.container
        );
        let memory_query = format!(
            r#"container_spec_memory_limit_bytes{{namespace="{}", pod="{}", container="{}"}}"#,
            container.namespace, container.pod, container.container
        );

        let cpu_limit_cores = self
            .fetch_scalar(&cpu_query)
            .await?
            .map_or(0.0, |quota| quota / CPU_QUOTA_PER_CORE);
        let memory_limit_bytes = self.fetch_scalar(&memory_query).await?.unwrap_or(0.0);

        Ok(ResourceLimits {
            cpu_limit_cores,
            memory_limit_bytes,
        })
    }
}

/// Top-level Prometheus query API response
#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: QueryData,
}

#[derive(Debug, Default, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<QueryResult>,
}

/// One matched series; `value` for instant queries, `values` for ranges
#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    value: Option<(f64, String)>,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

impl QueryResponse {
    /// Convert a range response into a time-ordered series
    ///
    /// Only the first matched series is used; label selectors target one
    /// container. Unparseable values are skipped with a warning.
    fn into_series(self) -> Series {
        if self.status != "success" {
            return Series::default();
        }

        let Some(result) = self.data.result.into_iter().next() else {
            return Series::default();
        };

        let samples = result
            .values
            .into_iter()
            .filter_map(|(timestamp, value)| match value.parse::<f64>() {
                Ok(value) => Some(Sample {
                    timestamp: timestamp as i64,
                    value,
                }),
                Err(_) => {
                    warn!(raw = %value, "Skipping unparseable sample value");
                    None
                }
            })
            .collect();

        Series::new(samples)
    }

    /// Extract the value of an instant query, if any series matched
    fn into_scalar(self) -> Option<f64> {
        if self.status != "success" {
            return None;
        }
        self.data
            .result
            .into_iter()
            .next()
            .and_then(|r| r.value)
            .and_then(|(_, value)| value.parse::<f64>().ok())
    }
}
