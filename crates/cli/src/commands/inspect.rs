//! Single-container inspection command

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use detector_lib::{
    detect::{Detector, SweepConfig},
    heuristics::HeuristicEngine,
    models::ContainerRef,
    providers::{KubeWorkloads, PrometheusProvider},
};

use crate::output::{color_classification, color_score, rule_rows, OutputFormat};

/// Analyze one container over a longer window and print the full verdict
pub async fn run(
    prometheus_url: &str,
    namespace: &str,
    pod: &str,
    container: &str,
    duration_minutes: u64,
    format: OutputFormat,
) -> Result<()> {
    let engine = HeuristicEngine::default();
    let prometheus = Arc::new(PrometheusProvider::new(prometheus_url)?);
    let workloads = Arc::new(KubeWorkloads::new().await?);

    let detector = Detector::new(
        engine,
        prometheus.clone(),
        prometheus,
        workloads,
        SweepConfig::default(),
    );

    let target = ContainerRef {
        namespace: namespace.to_string(),
        pod: pod.to_string(),
        container: container.to_string(),
        node: String::new(),
    };

    let detection = detector
        .inspect(&target, Duration::from_secs(duration_minutes * 60))
        .await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&detection)?);
        }
        OutputFormat::Table => {
            println!("{}", detection.container);
            println!(
                "Score: {}  Classification: {}",
                color_score(detection.verdict.composite_score),
                color_classification(detection.verdict.classification)
            );

            let table = tabled::Table::new(rule_rows(&detection.verdict))
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
