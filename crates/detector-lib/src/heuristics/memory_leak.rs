//! Memory leak pattern
//!
//! Near-idle CPU with steadily growing memory over a long window: the
//! process is not working, yet its footprint keeps climbing.

use serde_json::json;

use crate::config::Thresholds;
use crate::models::{Evidence, ResourceLimits, RuleOutcome, SeriesBundle};

/// Fraction of CPU samples that must sit below the very-low threshold
const IDLE_SAMPLE_FRACTION: f64 = 0.9;

pub(super) fn evaluate(
    bundle: &SeriesBundle,
    _limits: &ResourceLimits,
    cfg: &Thresholds,
) -> RuleOutcome {
    let cpu = &bundle.cpu;
    let memory = &bundle.memory;

    if cpu.is_empty() || memory.is_empty() || memory.len() < 2 {
        return RuleOutcome::disqualified("insufficient data");
    }

    let very_low_threshold = cfg.very_low_cpu_percent / 100.0;
    let idle = cpu
        .samples
        .iter()
        .filter(|s| s.value < very_low_threshold)
        .count();
    if (idle as f64) / (cpu.len() as f64) < IDLE_SAMPLE_FRACTION {
        return RuleOutcome::disqualified("CPU usage not consistently very low");
    }

    let memory_start = memory.samples[0].value;
    let memory_end = memory.samples[memory.len() - 1].value;
    if memory_start <= 0.0 {
        return RuleOutcome::disqualified("invalid initial memory value");
    }

    let memory_increase_percent = (memory_end - memory_start) / memory_start * 100.0;
    let duration_hours = (memory.samples[memory.len() - 1].timestamp
        - memory.samples[0].timestamp) as f64
        / 3600.0;

    let mut evidence = Evidence::new();
    evidence.insert(
        "memory_increase_percent".to_string(),
        json!(memory_increase_percent),
    );
    evidence.insert("duration_hours".to_string(), json!(duration_hours));

    if memory_increase_percent <= cfg.memory_increase_percent
        || duration_hours < cfg.memory_increase_duration_hours
    {
        return RuleOutcome::disqualified_with("no qualifying memory growth", evidence);
    }

    let mut score = 0.5;

    // Severity of the increase
    score += if memory_increase_percent > cfg.memory_increase_percent * 2.0 {
        0.3
    } else if memory_increase_percent > cfg.memory_increase_percent * 1.5 {
        0.2
    } else {
        0.1
    };

    // How long it has been going on
    score += if duration_hours >= cfg.memory_increase_duration_hours * 2.0 {
        0.2
    } else {
        0.1
    };

    RuleOutcome::scored(score, evidence)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{flat_series, series};
    use super::*;

    fn defaults() -> Thresholds {
        Thresholds::default()
    }

    /// Memory climbing linearly from `start` to `end` across `count` samples
    fn ramp(start: f64, end: f64, count: usize, step_secs: i64) -> crate::models::Series {
        let values: Vec<f64> = (0..count)
            .map(|i| start + (end - start) * i as f64 / (count - 1) as f64)
            .collect();
        series(0, step_secs, &values)
    }

    #[test]
    fn test_empty_series_disqualifies() {
        let outcome = evaluate(
            &SeriesBundle::default(),
            &ResourceLimits::default(),
            &defaults(),
        );
        assert_eq!(outcome.score, 0.0);
        assert_eq!(
            outcome.evidence.get("reason").and_then(|v| v.as_str()),
            Some("insufficient data")
        );
    }

    #[test]
    fn test_memory_doubling_while_idle_scores_full() {
        // Memory doubles over 2 hours; CPU pinned at 0.5% the whole window
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 121, 0.005),
            memory: ramp(100_000_000.0, 200_000_000.0, 121, 60),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());

        // 0.5 base + 0.3 (100% > 2x threshold) + 0.2 (2h >= 2x threshold)
        assert!((outcome.score - 1.0).abs() < 1e-9);
        assert_eq!(
            outcome.evidence.get("memory_increase_percent"),
            Some(&json!(100.0))
        );
        assert_eq!(outcome.evidence.get("duration_hours"), Some(&json!(2.0)));
    }

    #[test]
    fn test_busy_cpu_disqualifies() {
        // 20% of samples above the very-low threshold breaks the 90% gate
        let mut cpu_values = vec![0.005; 100];
        for value in cpu_values.iter_mut().take(20) {
            *value = 0.05;
        }
        let bundle = SeriesBundle {
            cpu: series(0, 60, &cpu_values),
            memory: ramp(100_000_000.0, 200_000_000.0, 100, 60),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
        assert_eq!(
            outcome.evidence.get("reason").and_then(|v| v.as_str()),
            Some("CPU usage not consistently very low")
        );
    }

    #[test]
    fn test_zero_initial_memory_disqualifies() {
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 10, 0.005),
            memory: series(0, 60, &[0.0, 1_000_000.0, 2_000_000.0]),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
        assert_eq!(
            outcome.evidence.get("reason").and_then(|v| v.as_str()),
            Some("invalid initial memory value")
        );
    }

    #[test]
    fn test_flat_memory_reports_facts_with_zero_score() {
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 121, 0.005),
            memory: flat_series(0, 60, 121, 100_000_000.0),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
        // Computed numbers still reported alongside the reason
        assert_eq!(
            outcome.evidence.get("memory_increase_percent"),
            Some(&json!(0.0))
        );
        assert!(outcome.evidence.contains_key("duration_hours"));
        assert!(outcome.evidence.contains_key("reason"));
    }

    #[test]
    fn test_mild_growth_gets_smaller_bonus() {
        // 6% growth over 1 hour: above threshold but below the 1.5x tier
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 61, 0.005),
            memory: ramp(100_000_000.0, 106_000_000.0, 61, 60),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        // 0.5 base + 0.1 severity + 0.1 duration
        assert!((outcome.score - 0.7).abs() < 1e-9);
    }
}
