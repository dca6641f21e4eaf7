//! Offline evaluation against labeled fixtures
//!
//! Scores recorded scenarios (series bundle + limits + ground-truth label)
//! with the engine and reports precision/recall/F1 plus the raw confusion
//! counts. Classification here is binary: a scenario is predicted a zombie
//! when its composite score reaches the threshold.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::heuristics::HeuristicEngine;
use crate::models::{ResourceLimits, SeriesBundle};

/// Ground-truth label for a fixture scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundTruth {
    Zombie,
    Normal,
}

impl std::fmt::Display for GroundTruth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroundTruth::Zombie => write!(f, "zombie"),
            GroundTruth::Normal => write!(f, "normal"),
        }
    }
}

/// One labeled scenario loaded from a fixture file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledScenario {
    pub name: String,
    pub expected: GroundTruth,
    pub series: SeriesBundle,
    #[serde(default)]
    pub limits: ResourceLimits,
}

/// Per-scenario evaluation outcome
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub expected: GroundTruth,
    pub predicted: GroundTruth,
    pub score: f64,
    pub correct: bool,
}

/// Aggregate quality metrics over an evaluation run
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

/// Full evaluation report
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub results: Vec<ScenarioResult>,
    pub metrics: EvaluationMetrics,
}

/// Load every `.json` fixture in a directory, sorted by file name
pub fn load_fixtures(dir: &Path) -> Result<Vec<LabeledScenario>> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read fixture directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut scenarios = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let scenario: LabeledScenario = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))?;
        scenarios.push(scenario);
    }

    Ok(scenarios)
}

/// Score every scenario and compute the aggregate metrics
pub fn evaluate(
    engine: &HeuristicEngine,
    scenarios: &[LabeledScenario],
    score_threshold: f64,
) -> EvaluationReport {
    let mut results = Vec::with_capacity(scenarios.len());
    let mut true_positives = 0usize;
    let mut false_positives = 0usize;
    let mut true_negatives = 0usize;
    let mut false_negatives = 0usize;

    for scenario in scenarios {
        let verdict = engine.analyze(&scenario.series, &scenario.limits);
        let predicted = if verdict.composite_score >= score_threshold {
            GroundTruth::Zombie
        } else {
            GroundTruth::Normal
        };

        match (scenario.expected, predicted) {
            (GroundTruth::Zombie, GroundTruth::Zombie) => true_positives += 1,
            (GroundTruth::Normal, GroundTruth::Zombie) => false_positives += 1,
            (GroundTruth::Normal, GroundTruth::Normal) => true_negatives += 1,
            (GroundTruth::Zombie, GroundTruth::Normal) => false_negatives += 1,
        }

        results.push(ScenarioResult {
            name: scenario.name.clone(),
            expected: scenario.expected,
            predicted,
            score: verdict.composite_score,
            correct: scenario.expected == predicted,
        });
    }

    let metrics = EvaluationMetrics {
        accuracy: ratio(
            true_positives + true_negatives,
            true_positives + true_negatives + false_positives + false_negatives,
        ),
        precision: ratio(true_positives, true_positives + false_positives),
        recall: ratio(true_positives, true_positives + false_negatives),
        f1_score: f1(
            ratio(true_positives, true_positives + false_positives),
            ratio(true_positives, true_positives + false_negatives),
        ),
        true_positives,
        false_positives,
        true_negatives,
        false_negatives,
    };

    EvaluationReport { results, metrics }
}

/// Safe division, zero when the denominator is zero
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}
