//! Stuck process pattern
//!
//! Short CPU spikes each followed by a long near-zero stall, repeating:
//! the shape of a worker that wakes up, fails to make progress, and hangs
//! until the next attempt.

use serde_json::json;

use crate::config::Thresholds;
use crate::models::{Evidence, ResourceLimits, RuleOutcome, Sample, SeriesBundle};

/// Minimum CPU samples before spike/stall structure is meaningful
const MIN_SAMPLES: usize = 10;

/// Closed index interval of consecutive above-threshold samples
#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    end: usize,
}

pub(super) fn evaluate(
    bundle: &SeriesBundle,
    _limits: &ResourceLimits,
    cfg: &Thresholds,
) -> RuleOutcome {
    let cpu = &bundle.cpu;
    if cpu.len() < MIN_SAMPLES {
        return RuleOutcome::disqualified("insufficient data");
    }

    let spike_threshold = cfg.cpu_spike_percent / 100.0;
    let stall_threshold = cfg.post_spike_low_cpu_percent / 100.0;

    let spikes = spike_runs(&cpu.samples, spike_threshold, cfg.cpu_spike_duration_seconds);

    let pattern_count = spikes
        .iter()
        .filter(|spike| {
            stall_follows(
                &cpu.samples,
                spike.end,
                stall_threshold,
                cfg.post_spike_duration_minutes,
            )
        })
        .count() as u32;

    let mut evidence = Evidence::new();
    evidence.insert("pattern_count".to_string(), json!(pattern_count));
    evidence.insert("spike_count".to_string(), json!(spikes.len()));

    if pattern_count >= cfg.spike_pattern_count {
        let score = 0.7
            + f64::min(
                0.3,
                f64::from(pattern_count - cfg.spike_pattern_count) * 0.1,
            );
        RuleOutcome::scored(score, evidence)
    } else if pattern_count > 0 {
        let score = 0.3 + f64::from(pattern_count) / f64::from(cfg.spike_pattern_count) * 0.4;
        RuleOutcome::scored(score, evidence)
    } else {
        RuleOutcome::disqualified_with("no spike-stall patterns found", evidence)
    }
}

/// Maximal runs of samples at or above `threshold`, each closed by a later
/// sub-threshold sample and spanning at most `max_span_seconds`
///
/// A run still open when the series ends is dropped, so a spike touching the
/// window edge never counts. A single forward scan: a sample cannot belong
/// to two runs.
fn spike_runs(samples: &[Sample], threshold: f64, max_span_seconds: f64) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;

    for (i, sample) in samples.iter().enumerate() {
        if sample.value >= threshold {
            open.get_or_insert(i);
        } else if let Some(start) = open.take() {
            let run = Run { start, end: i - 1 };
            let span = (samples[run.end].timestamp - samples[run.start].timestamp) as f64;
            if span <= max_span_seconds {
                runs.push(run);
            }
        }
    }

    runs
}

/// Whether a contiguous low-CPU stall of at least two samples spanning
/// `min_minutes` starts right after the sample at `spike_end`
fn stall_follows(samples: &[Sample], spike_end: usize, threshold: f64, min_minutes: f64) -> bool {
    let stall: Vec<&Sample> = samples[spike_end + 1..]
        .iter()
        .take_while(|s| s.value < threshold)
        .collect();

    if stall.len() < 2 {
        return false;
    }

    let span_minutes = (stall[stall.len() - 1].timestamp - stall[0].timestamp) as f64 / 60.0;
    span_minutes >= min_minutes
}
