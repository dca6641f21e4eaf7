//! Resource ratio imbalance
//!
//! A large memory allocation held nearly unused while CPU stays close to
//! zero for hours: reserved capacity nobody is coming back for.

use serde_json::json;

use crate::config::Thresholds;
use crate::models::{Evidence, ResourceLimits, RuleOutcome, SeriesBundle};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub(super) fn evaluate(
    bundle: &SeriesBundle,
    limits: &ResourceLimits,
    cfg: &Thresholds,
) -> RuleOutcome {
    let cpu = &bundle.cpu;
    let memory = &bundle.memory;

    if cpu.is_empty() || memory.is_empty() {
        return RuleOutcome::disqualified("insufficient data");
    }

    // A zero limit means unknown and lands below the minimum, so the ratio
    // below never divides by zero
    let allocation_mb = limits.memory_limit_bytes / BYTES_PER_MB;
    if allocation_mb < cfg.memory_min_allocation_mb {
        return RuleOutcome::disqualified("memory allocation below threshold");
    }

    let avg_memory = memory.mean().unwrap_or(0.0);
    let usage_ratio = avg_memory / limits.memory_limit_bytes * 100.0;

    let very_low_threshold = cfg.very_low_cpu_percent / 100.0;
    let idle: Vec<_> = cpu
        .samples
        .iter()
        .filter(|s| s.value < very_low_threshold)
        .collect();
    if idle.len() < 2 {
        return RuleOutcome::disqualified("not enough very-low-CPU samples");
    }
    let idle_hours = (idle[idle.len() - 1].timestamp - idle[0].timestamp) as f64 / 3600.0;

    let mut evidence = Evidence::new();
    evidence.insert("memory_allocation_mb".to_string(), json!(allocation_mb));
    evidence.insert("memory_usage_ratio".to_string(), json!(usage_ratio));
    evidence.insert(
        "very_low_cpu_duration_hours".to_string(),
        json!(idle_hours),
    );

    if usage_ratio >= cfg.memory_usage_ratio_percent
        || idle_hours < cfg.very_low_cpu_duration_hours
    {
        return RuleOutcome::disqualified_with("no unused-allocation pattern", evidence);
    }

    let mut score = 0.4;

    // Bigger allocations waste more
    score += if allocation_mb >= cfg.memory_min_allocation_mb * 4.0 {
        0.3
    } else if allocation_mb >= cfg.memory_min_allocation_mb * 2.0 {
        0.2
    } else {
        0.1
    };

    score += if idle_hours >= cfg.very_low_cpu_duration_hours * 2.0 {
        0.3
    } else {
        0.1
    };

    RuleOutcome::scored(score, evidence)
}
