//! Engine configuration: detection thresholds and rule weights
//!
//! Both are loaded once at engine construction and immutable afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance when validating that rule weights sum to 1.0
const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// Configuration errors, raised at construction time and never per analysis
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rule weights sum to {sum}, expected 1.0")]
    WeightSum { sum: f64 },
}

/// Tunable thresholds for the heuristic rules
///
/// Percent fields compare against CPU usage expressed as a fraction of a
/// core (`value < percent / 100`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// CPU usage below this percent counts as low
    #[serde(default = "default_low_cpu_percent")]
    pub low_cpu_percent: f64,

    /// Minutes of sustained low CPU before the rule fires
    #[serde(default = "default_low_cpu_duration_minutes")]
    pub low_cpu_duration_minutes: f64,

    /// Memory growth percent that qualifies as a leak
    #[serde(default = "default_memory_increase_percent")]
    pub memory_increase_percent: f64,

    /// Hours the memory growth must span
    #[serde(default = "default_memory_increase_duration_hours")]
    pub memory_increase_duration_hours: f64,

    /// CPU usage at or above this percent counts as a spike
    #[serde(default = "default_cpu_spike_percent")]
    pub cpu_spike_percent: f64,

    /// Maximum wall-clock span of a qualifying spike
    #[serde(default = "default_cpu_spike_duration_seconds")]
    pub cpu_spike_duration_seconds: f64,

    /// CPU usage below this percent counts as a post-spike stall
    #[serde(default = "default_post_spike_low_cpu_percent")]
    pub post_spike_low_cpu_percent: f64,

    /// Minutes a post-spike stall must last
    #[serde(default = "default_post_spike_duration_minutes")]
    pub post_spike_duration_minutes: f64,

    /// Spike-then-stall patterns needed for a confident match
    #[serde(default = "default_spike_pattern_count")]
    pub spike_pattern_count: u32,

    /// Transmit rates below this many KB/s count as a failed attempt
    #[serde(default = "default_network_low_transfer_kb")]
    pub network_low_transfer_kb: f64,

    /// Expected minutes between retry attempts
    #[serde(default = "default_network_attempt_interval_minutes")]
    pub network_attempt_interval_minutes: f64,

    /// Minimum memory allocation (MB) worth flagging as imbalanced
    #[serde(default = "default_memory_min_allocation_mb")]
    pub memory_min_allocation_mb: f64,

    /// Memory usage below this percent of the limit counts as unused
    #[serde(default = "default_memory_usage_ratio_percent")]
    pub memory_usage_ratio_percent: f64,

    /// CPU usage below this percent counts as near-idle
    #[serde(default = "default_very_low_cpu_percent")]
    pub very_low_cpu_percent: f64,

    /// Hours of near-idle CPU before imbalance qualifies
    #[serde(default = "default_very_low_cpu_duration_hours")]
    pub very_low_cpu_duration_hours: f64,
}

fn default_low_cpu_percent() -> f64 {
    5.0
}

fn default_low_cpu_duration_minutes() -> f64 {
    30.0
}

fn default_memory_increase_percent() -> f64 {
    5.0
}

fn default_memory_increase_duration_hours() -> f64 {
    1.0
}

fn default_cpu_spike_percent() -> f64 {
    50.0
}

fn default_cpu_spike_duration_seconds() -> f64 {
    30.0
}

fn default_post_spike_low_cpu_percent() -> f64 {
    2.0
}

fn default_post_spike_duration_minutes() -> f64 {
    15.0
}

fn default_spike_pattern_count() -> u32 {
    3
}

fn default_network_low_transfer_kb() -> f64 {
    1.0
}

fn default_network_attempt_interval_minutes() -> f64 {
    5.0
}

fn default_memory_min_allocation_mb() -> f64 {
    500.0
}

fn default_memory_usage_ratio_percent() -> f64 {
    10.0
}

fn default_very_low_cpu_percent() -> f64 {
    1.0
}

fn default_very_low_cpu_duration_hours() -> f64 {
    1.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_cpu_percent: default_low_cpu_percent(),
            low_cpu_duration_minutes: default_low_cpu_duration_minutes(),
            memory_increase_percent: default_memory_increase_percent(),
            memory_increase_duration_hours: default_memory_increase_duration_hours(),
            cpu_spike_percent: default_cpu_spike_percent(),
            cpu_spike_duration_seconds: default_cpu_spike_duration_seconds(),
            post_spike_low_cpu_percent: default_post_spike_low_cpu_percent(),
            post_spike_duration_minutes: default_post_spike_duration_minutes(),
            spike_pattern_count: default_spike_pattern_count(),
            network_low_transfer_kb: default_network_low_transfer_kb(),
            network_attempt_interval_minutes: default_network_attempt_interval_minutes(),
            memory_min_allocation_mb: default_memory_min_allocation_mb(),
            memory_usage_ratio_percent: default_memory_usage_ratio_percent(),
            very_low_cpu_percent: default_very_low_cpu_percent(),
            very_low_cpu_duration_hours: default_very_low_cpu_duration_hours(),
        }
    }
}

/// Per-rule weights used to compose the composite score
///
/// Must sum to 1.0; validated when the engine is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleWeights {
    #[serde(default = "default_weight_sustained_low_cpu")]
    pub sustained_low_cpu: f64,
    #[serde(default = "default_weight_memory_leak")]
    pub memory_leak: f64,
    #[serde(default = "default_weight_stuck_process")]
    pub stuck_process: f64,
    #[serde(default = "default_weight_network_timeout")]
    pub network_timeout: f64,
    #[serde(default = "default_weight_resource_imbalance")]
    pub resource_imbalance: f64,
}

fn default_weight_sustained_low_cpu() -> f64 {
    0.35
}

fn default_weight_memory_leak() -> f64 {
    0.25
}

fn default_weight_stuck_process() -> f64 {
    0.15
}

fn default_weight_network_timeout() -> f64 {
    0.15
}

fn default_weight_resource_imbalance() -> f64 {
    0.10
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            sustained_low_cpu: default_weight_sustained_low_cpu(),
            memory_leak: default_weight_memory_leak(),
            stuck_process: default_weight_stuck_process(),
            network_timeout: default_weight_network_timeout(),
            resource_imbalance: default_weight_resource_imbalance(),
        }
    }
}

impl RuleWeights {
    pub fn sum(&self) -> f64 {
        self.sustained_low_cpu
            + self.memory_leak
            + self.stuck_process
            + self.network_timeout
            + self.resource_imbalance
    }

    /// Check the sum-to-one invariant
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        assert!(RuleWeights::default().validate().is_ok());
    }

    #[test]
    fn test_unbalanced_weights_rejected() {
        let weights = RuleWeights {
            sustained_low_cpu: 0.5,
            ..RuleWeights::default()
        };
        let err = weights.validate().unwrap_err();
        assert!(err.to_string().contains("expected 1.0"));
    }

    #[test]
    fn test_thresholds_defaults() {
        let thresholds = Thresholds::default();
        assert_eq!(thresholds.low_cpu_percent, 5.0);
        assert_eq!(thresholds.low_cpu_duration_minutes, 30.0);
        assert_eq!(thresholds.spike_pattern_count, 3);
        assert_eq!(thresholds.memory_min_allocation_mb, 500.0);
    }

    #[test]
    fn test_thresholds_deserialize_with_partial_overrides() {
        let thresholds: Thresholds =
            serde_json::from_str(r#"{"low_cpu_percent": 10.0}"#).unwrap();
        assert_eq!(thresholds.low_cpu_percent, 10.0);
        // Untouched fields fall back to defaults
        assert_eq!(thresholds.very_low_cpu_percent, 1.0);
    }
}
