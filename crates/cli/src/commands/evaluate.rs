//! Offline evaluation command

use std::path::Path;

use anyhow::Result;
use detector_lib::{evaluation, heuristics::HeuristicEngine};
use tabled::Tabled;

use crate::output::{format_percent, format_score, print_success, print_warning, OutputFormat};

/// Row for the per-scenario results table
#[derive(Tabled)]
struct ScenarioRow {
    #[tabled(rename = "Scenario")]
    name: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Predicted")]
    predicted: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Correct")]
    correct: String,
}

/// Score labeled fixtures and print precision/recall metrics
pub fn run(fixtures: &Path, threshold: f64, format: OutputFormat) -> Result<()> {
    let engine = HeuristicEngine::default();
    let scenarios = evaluation::load_fixtures(fixtures)?;

    if scenarios.is_empty() {
        print_warning("No fixtures found");
        return Ok(());
    }

    let report = evaluation::evaluate(&engine, &scenarios, threshold);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            let rows: Vec<ScenarioRow> = report
                .results
                .iter()
                .map(|r| ScenarioRow {
                    name: r.name.clone(),
                    expected: r.expected.to_string(),
                    predicted: r.predicted.to_string(),
                    score: format_score(r.score),
                    correct: if r.correct { "yes" } else { "no" }.to_string(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);

            let metrics = &report.metrics;
            println!();
            println!("Accuracy:  {}", format_percent(metrics.accuracy));
            println!("Precision: {}", format_percent(metrics.precision));
            println!("Recall:    {}", format_percent(metrics.recall));
            println!("F1 score:  {}", format_percent(metrics.f1_score));
            println!(
                "TP: {}  FP: {}  TN: {}  FN: {}",
                metrics.true_positives,
                metrics.false_positives,
                metrics.true_negatives,
                metrics.false_negatives
            );
            print_success(&format!("Evaluated {} scenarios", report.results.len()));
        }
    }

    Ok(())
}
