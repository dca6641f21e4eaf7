//! Detection sweep command

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use detector_lib::{
    config::{RuleWeights, Thresholds},
    detect::{Detector, SweepConfig},
    heuristics::HeuristicEngine,
    models::Detection,
    providers::{KubeWorkloads, PrometheusProvider},
};
use tabled::Tabled;

use crate::output::{
    color_classification, color_score, print_info, rule_rows, OutputFormat,
};

/// Row for the detections table
#[derive(Tabled)]
struct DetectionRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Classification")]
    classification: String,
}

/// Run a one-shot detection sweep and print the results
pub async fn run(
    prometheus_url: &str,
    duration_minutes: u64,
    threshold: f64,
    exclude_namespaces: &str,
    details: bool,
    format: OutputFormat,
) -> Result<()> {
    let engine = HeuristicEngine::new(Thresholds::default(), RuleWeights::default())?;
    let prometheus = Arc::new(PrometheusProvider::new(prometheus_url)?);
    let workloads = Arc::new(KubeWorkloads::new().await?);

    let config = SweepConfig {
        score_threshold: threshold,
        exclude_namespaces: exclude_namespaces
            .split(',')
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty())
            .collect(),
        window: Duration::from_secs(duration_minutes * 60),
    };

    let detector = Detector::new(engine, prometheus.clone(), prometheus, workloads, config);
    let summary = detector.sweep().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary.detections)?);
        }
        OutputFormat::Table => {
            if summary.detections.is_empty() {
                print_info("No zombie containers detected");
                return Ok(());
            }

            let rows: Vec<DetectionRow> = summary
                .detections
                .iter()
                .map(|d| DetectionRow {
                    namespace: d.container.namespace.clone(),
                    pod: d.container.pod.clone(),
                    container: d.container.container.clone(),
                    node: d.container.node.clone(),
                    score: color_score(d.verdict.composite_score),
                    classification: color_classification(d.verdict.classification),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} zombie containers", summary.detections.len());

            if details {
                for detection in &summary.detections {
                    print_details(detection);
                }
            }
        }
    }

    Ok(())
}

/// Print the per-rule breakdown for one detection
fn print_details(detection: &Detection) {
    println!("\n{}", detection.container);
    let table = tabled::Table::new(rule_rows(&detection.verdict))
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}
