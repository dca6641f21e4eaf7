//! Sustained low CPU with held memory allocation
//!
//! The classic zombie shape: a container that sits below the low-CPU
//! threshold for longer than the configured duration while holding (or
//! growing) its memory footprint and moving essentially no network traffic.

use serde_json::json;

use crate::config::Thresholds;
use crate::models::{Evidence, ResourceLimits, RuleOutcome, SeriesBundle};

/// Average network rate above this counts as active (bytes/sec)
///
/// Not part of [`Thresholds`]: changing it shifts classification semantics.
const NETWORK_ACTIVE_BYTES_PER_SEC: f64 = 1000.0;

pub(super) fn evaluate(
    bundle: &SeriesBundle,
    _limits: &ResourceLimits,
    cfg: &Thresholds,
) -> RuleOutcome {
    let cpu = &bundle.cpu;
    let memory = &bundle.memory;

    if cpu.is_empty() || memory.is_empty() {
        return RuleOutcome::disqualified("insufficient data");
    }

    let low_threshold = cfg.low_cpu_percent / 100.0;
    let low: Vec<_> = cpu
        .samples
        .iter()
        .filter(|s| s.value < low_threshold)
        .collect();

    if low.is_empty() {
        return RuleOutcome::disqualified("CPU usage not consistently low");
    }
    if low.len() < 2 {
        return RuleOutcome::disqualified("not enough low-CPU samples");
    }

    let low_duration_minutes =
        (low[low.len() - 1].timestamp - low[0].timestamp) as f64 / 60.0;

    if memory.len() < 2 {
        return RuleOutcome::disqualified("not enough memory samples");
    }

    let memory_start = memory.samples[0].value;
    let memory_end = memory.samples[memory.len() - 1].value;
    let memory_change_percent = if memory_start > 0.0 {
        (memory_end - memory_start) / memory_start * 100.0
    } else {
        0.0
    };

    // Activity is only confirmable when both channels reported data
    let network_active = match (bundle.network_rx.mean(), bundle.network_tx.mean()) {
        (Some(avg_rx), Some(avg_tx)) => {
            avg_rx > NETWORK_ACTIVE_BYTES_PER_SEC || avg_tx > NETWORK_ACTIVE_BYTES_PER_SEC
        }
        _ => false,
    };

    if low_duration_minutes < cfg.low_cpu_duration_minutes {
        let mut evidence = Evidence::new();
        evidence.insert(
            "low_cpu_duration_minutes".to_string(),
            json!(low_duration_minutes),
        );
        return RuleOutcome::disqualified_with("low-CPU duration below threshold", evidence);
    }

    let mut score = 0.6;
    let mut evidence = Evidence::new();
    evidence.insert(
        "low_cpu_duration_minutes".to_string(),
        json!(low_duration_minutes),
    );

    // Memory held steady or growing while idle
    if memory_change_percent >= 0.0 {
        score += 0.2;
        evidence.insert(
            "memory_change_percent".to_string(),
            json!(memory_change_percent),
        );
    }

    if !network_active {
        score += 0.2;
        evidence.insert("network_active".to_string(), json!(false));
    }

    RuleOutcome::scored(score, evidence)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{flat_series, series};
    use super::*;

    fn defaults() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn test_empty_cpu_series_disqualifies() {
        let bundle = SeriesBundle {
            memory: flat_series(0, 60, 10, 100_000_000.0),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
        assert_eq!(
            outcome.evidence.get("reason").and_then(|v| v.as_str()),
            Some("insufficient data")
        );
    }

    #[test]
    fn test_idle_container_scores_full() {
        // 45 minutes at 2% CPU, flat memory, no network data at all
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 46, 0.02),
            memory: flat_series(0, 60, 46, 100_000_000.0),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());

        // 0.6 base + 0.2 stable memory + 0.2 inactive network
        assert!((outcome.score - 1.0).abs() < 1e-9);
        assert!(outcome.evidence.contains_key("low_cpu_duration_minutes"));
        assert_eq!(
            outcome.evidence.get("network_active"),
            Some(&json!(false))
        );
    }

    #[test]
    fn test_active_network_withholds_bonus() {
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 46, 0.02),
            memory: flat_series(0, 60, 46, 100_000_000.0),
            network_rx: flat_series(0, 60, 46, 50_000.0),
            network_tx: flat_series(0, 60, 46, 2_000.0),
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert!((outcome.score - 0.8).abs() < 1e-9);
        assert!(!outcome.evidence.contains_key("network_active"));
    }

    #[test]
    fn test_shrinking_memory_withholds_bonus() {
        let mut values = vec![200_000_000.0; 46];
        values[45] = 150_000_000.0;
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 46, 0.02),
            memory: series(0, 60, &values),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        // Base plus the inactive-network bonus only
        assert!((outcome.score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_short_low_period_disqualifies_with_duration() {
        // Only 10 minutes of low CPU
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 11, 0.02),
            memory: flat_series(0, 60, 11, 100_000_000.0),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.evidence.contains_key("reason"));
        assert_eq!(
            outcome.evidence.get("low_cpu_duration_minutes"),
            Some(&json!(10.0))
        );
    }

    #[test]
    fn test_score_monotonic_in_low_duration() {
        let score_for = |minutes: usize| {
            let bundle = SeriesBundle {
                cpu: flat_series(0, 60, minutes + 1, 0.02),
                memory: flat_series(0, 60, minutes + 1, 100_000_000.0),
                ..SeriesBundle::default()
            };
            evaluate(&bundle, &ResourceLimits::default(), &defaults()).score
        };

        let mut previous = 0.0;
        for minutes in [10, 29, 30, 45, 90, 240] {
            let score = score_for(minutes);
            assert!(
                score >= previous,
                "score must not decrease as duration grows ({minutes}m)"
            );
            previous = score;
        }
    }

    #[test]
    fn test_busy_cpu_disqualifies() {
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 46, 0.5),
            memory: flat_series(0, 60, 46, 100_000_000.0),
            ..SeriesBundle::default()
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
        assert_eq!(
            outcome.evidence.get("reason").and_then(|v| v.as_str()),
            Some("CPU usage not consistently low")
        );
    }
}
