//! Network timeout pattern
//!
//! Idle CPU with small, evenly spaced transmit attempts: a process stuck in
//! a connect/retry loop against a peer that no longer answers. Periodicity
//! is judged by the coefficient of variation of the inter-attempt intervals.

use serde_json::json;

use crate::config::Thresholds;
use crate::models::{Evidence, ResourceLimits, RuleOutcome, SeriesBundle};

/// Fraction of CPU samples that must sit below the low-CPU threshold
const LOW_CPU_SAMPLE_FRACTION: f64 = 0.9;

/// Minimum retry attempts before periodicity can be judged
const MIN_SPIKES: usize = 3;

pub(super) fn evaluate(
    bundle: &SeriesBundle,
    _limits: &ResourceLimits,
    cfg: &Thresholds,
) -> RuleOutcome {
    let cpu = &bundle.cpu;
    let rx = &bundle.network_rx;
    let tx = &bundle.network_tx;

    if cpu.is_empty() || rx.is_empty() || tx.is_empty() {
        return RuleOutcome::disqualified("insufficient data");
    }

    let low_threshold = cfg.low_cpu_percent / 100.0;
    let low = cpu
        .samples
        .iter()
        .filter(|s| s.value < low_threshold)
        .count();
    if (low as f64) / (cpu.len() as f64) < LOW_CPU_SAMPLE_FRACTION {
        return RuleOutcome::disqualified("CPU usage not consistently low");
    }

    // Transmit samples that moved something, but less than a failed
    // handshake's worth of data
    let transfer_cutoff = cfg.network_low_transfer_kb * 1024.0;
    let spike_timestamps: Vec<i64> = tx
        .samples
        .iter()
        .filter(|s| s.value > 0.0 && s.value < transfer_cutoff)
        .map(|s| s.timestamp)
        .collect();

    if spike_timestamps.len() < MIN_SPIKES {
        return RuleOutcome::disqualified("not enough network activity spikes");
    }

    let intervals: Vec<f64> = spike_timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64 / 60.0)
        .collect();
    if intervals.is_empty() {
        return RuleOutcome::disqualified("could not compute spike intervals");
    }

    let avg_interval = intervals.iter().sum::<f64>() / intervals.len() as f64;
    let variance = intervals
        .iter()
        .map(|i| (i - avg_interval).powi(2))
        .sum::<f64>()
        / intervals.len() as f64;
    let cv = if avg_interval > 0.0 {
        variance.sqrt() / avg_interval
    } else {
        f64::INFINITY
    };

    let mut evidence = Evidence::new();
    evidence.insert(
        "network_spike_count".to_string(),
        json!(spike_timestamps.len()),
    );
    evidence.insert("avg_interval_minutes".to_string(), json!(avg_interval));
    evidence.insert("interval_cv".to_string(), json!(cv));

    let in_retry_range =
        avg_interval >= 1.0 && avg_interval <= cfg.network_attempt_interval_minutes * 2.0;
    if !in_retry_range || cv >= 0.5 {
        return RuleOutcome::disqualified_with("no periodic low-transfer pattern", evidence);
    }

    let mut score = 0.5;

    score += if spike_timestamps.len() >= 10 {
        0.3
    } else if spike_timestamps.len() >= 5 {
        0.2
    } else {
        0.1
    };

    score += if cv < 0.3 {
        0.2
    } else if cv < 0.4 {
        0.1
    } else {
        0.0
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

    /// Bundle with idle CPU and `tx_values` on a fixed grid
    fn retry_bundle(step_secs: i64, tx_values: &[f64]) -> SeriesBundle {
        let count = tx_values.len();
        SeriesBundle {
            cpu: flat_series(0, step_secs, count, 0.001),
            memory: flat_series(0, step_secs, count, 100_000_000.0),
            network_rx: flat_series(0, step_secs, count, 100.0),
            network_tx: series(0, step_secs, tx_values),
        }
    }

    #[test]
    fn test_missing_network_series_disqualifies() {
        let bundle = SeriesBundle {
            cpu: flat_series(0, 60, 20, 0.001),
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
    fn test_perfectly_periodic_retries_score_full() {
        // Ten tiny transmits exactly two minutes apart: cv is zero
        let bundle = retry_bundle(120, &[500.0; 10]);
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());

        // 0.5 base + 0.3 (>= 10 spikes) + 0.2 (cv < 0.3)
        assert!((outcome.score - 1.0).abs() < 1e-9);
        assert_eq!(
            outcome.evidence.get("network_spike_count"),
            Some(&json!(10))
        );
        assert_eq!(
            outcome.evidence.get("avg_interval_minutes"),
            Some(&json!(2.0))
        );
    }

    #[test]
    fn test_few_spikes_get_smaller_bonus() {
        let bundle = retry_bundle(120, &[500.0; 4]);
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        // 0.5 + 0.1 (< 5 spikes) + 0.2 (cv < 0.3)
        assert!((outcome.score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_spikes_disqualify() {
        let bundle = retry_bundle(120, &[500.0, 500.0, 0.0, 0.0]);
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
        assert_eq!(
            outcome.evidence.get("reason").and_then(|v| v.as_str()),
            Some("not enough network activity spikes")
        );
    }

    #[test]
    fn test_large_transfers_are_not_retries() {
        // 10 KB/s is real traffic, not a timed-out handshake
        let bundle = retry_bundle(120, &[10_240.0; 10]);
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn test_irregular_intervals_disqualify_with_facts() {
        // Spikes at 0s, 1m, 10m, 11m, 40m: wildly varying gaps
        let mut tx = vec![0.0; 41];
        for idx in [0, 1, 10, 11, 40] {
            tx[idx] = 500.0;
        }
        let bundle = retry_bundle(60, &tx);
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.evidence.contains_key("interval_cv"));
        assert_eq!(
            outcome.evidence.get("reason").and_then(|v| v.as_str()),
            Some("no periodic low-transfer pattern")
        );
    }

    #[test]
    fn test_busy_cpu_disqualifies() {
        let bundle = SeriesBundle {
            cpu: flat_series(0, 120, 10, 0.2),
            memory: flat_series(0, 120, 10, 100_000_000.0),
            network_rx: flat_series(0, 120, 10, 100.0),
            network_tx: flat_series(0, 120, 10, 500.0),
        };
        let outcome = evaluate(&bundle, &ResourceLimits::default(), &defaults());
        assert_eq!(outcome.score, 0.0);
        assert_eq!(
            outcome.evidence.get("reason").and_then(|v| v.as_str()),
            Some("CPU usage not consistently low")
        );
    }
}
