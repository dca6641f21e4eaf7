//! Zombie Detector daemon
//!
//! Runs the enumerate -> evaluate -> report cycle on a fixed interval
//! against the cluster's workload containers, and serves health and
//! Prometheus metrics endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use detector_lib::{
    config::RuleWeights,
    detect::{DetectionLoop, Detector, LoopConfig},
    health::{components, HealthRegistry},
    heuristics::HeuristicEngine,
    observability::{DetectorMetrics, StructuredLogger},
    providers::{KubeWorkloads, PrometheusProvider},
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const DETECTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting zombie-detector");

    // Load configuration
    let config = config::DaemonConfig::load()?;
    info!(
        prometheus_url = %config.prometheus_url,
        sweep_interval_secs = config.sweep_interval_secs,
        score_threshold = config.score_threshold,
        "Detector configured"
    );

    // Build the scoring engine; invalid weights abort startup
    let engine = HeuristicEngine::new(config.thresholds.clone(), RuleWeights::default())?;

    // Wire up providers
    let prometheus = Arc::new(PrometheusProvider::new(&config.prometheus_url)?);
    let workloads = Arc::new(KubeWorkloads::new().await?);

    let detector = Arc::new(Detector::new(
        engine,
        prometheus.clone(),
        prometheus,
        workloads,
        config.sweep_config(),
    ));

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::WORKLOAD_PROVIDER).await;
    health_registry.register(components::SERIES_PROVIDER).await;
    health_registry.register(components::DETECTION_LOOP).await;

    // Initialize metrics and structured logger
    let metrics = DetectorMetrics::new();
    let logger = StructuredLogger::new("zombie-detector");
    logger.log_startup(DETECTOR_VERSION);

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics.clone()));

    // Mark detector as ready after initialization
    health_registry.set_ready(true).await;

    // Start health and metrics server
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Start the detection loop
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let detection_loop = DetectionLoop::new(
        detector,
        LoopConfig {
            interval: Duration::from_secs(config.sweep_interval_secs),
        },
        metrics,
        logger.clone(),
    );
    let loop_handle = tokio::spawn(detection_loop.run(shutdown_rx));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    let _ = shutdown_tx.send(());
    let _ = loop_handle.await;
    api_handle.abort();

    Ok(())
}
