//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use detector_lib::models::{Classification, RuleOutcome, Verdict};
use tabled::Tabled;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for the per-rule breakdown table
#[derive(Tabled)]
pub struct RuleRow {
    #[tabled(rename = "Rule")]
    pub rule: String,
    #[tabled(rename = "Score")]
    pub score: String,
    #[tabled(rename = "Evidence")]
    pub evidence: String,
}

/// Build per-rule rows for a verdict, in rule-name order
pub fn rule_rows(verdict: &Verdict) -> Vec<RuleRow> {
    verdict
        .per_rule
        .iter()
        .map(|(name, outcome)| RuleRow {
            rule: name.clone(),
            score: format!("{:.2}", outcome.score),
            evidence: evidence_summary(outcome),
        })
        .collect()
}

/// Compact one-line rendering of a rule's evidence
pub fn evidence_summary(outcome: &RuleOutcome) -> String {
    outcome
        .evidence
        .iter()
        .map(|(key, value)| match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => format!("{key}={f:.2}"),
                None => format!("{key}={n}"),
            },
            serde_json::Value::String(s) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a composite score with two decimals
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

/// Color a composite score by severity band
pub fn color_score(score: f64) -> String {
    let formatted = format_score(score);
    if score >= 70.0 {
        formatted.red().to_string()
    } else if score >= 40.0 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}

/// Color a classification label
pub fn color_classification(classification: Classification) -> String {
    let label = classification.to_string();
    match classification {
        Classification::Zombie => label.red().bold().to_string(),
        Classification::PotentialZombie => label.yellow().to_string(),
        Classification::Normal => label.green().to_string(),
    }
}

/// Format a ratio as a percentage
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}
