//! Heuristic rules for zombie container detection
//!
//! Five independent pattern detectors each inspect a container's resource
//! usage series and produce a sub-score in [0, 1] with supporting evidence:
//! - Sustained low CPU with held memory allocation
//! - Memory leak (growth while near-idle)
//! - Stuck process (spike-then-stall repetition)
//! - Network timeout (periodic tiny transmit attempts)
//! - Resource imbalance (large allocation, negligible use)
//!
//! The engine weighs the sub-scores into a 0-100 composite and a three-way
//! classification. Rules are pure functions over immutable series snapshots;
//! they share no state and may run in any order.

mod memory_leak;
mod network_timeout;
mod resource_imbalance;
mod stuck_process;
mod sustained_low_cpu;

use std::collections::BTreeMap;

use crate::config::{ConfigError, RuleWeights, Thresholds};
use crate::models::{Classification, ResourceLimits, RuleOutcome, SeriesBundle, Verdict};

/// Rule names as they appear in verdicts and reports
pub const SUSTAINED_LOW_CPU: &str = "sustained_low_cpu";
pub const MEMORY_LEAK: &str = "memory_leak";
pub const STUCK_PROCESS: &str = "stuck_process";
pub const NETWORK_TIMEOUT: &str = "network_timeout";
pub const RESOURCE_IMBALANCE: &str = "resource_imbalance";

/// All rule names in evaluation order
pub const RULE_NAMES: [&str; 5] = [
    SUSTAINED_LOW_CPU,
    MEMORY_LEAK,
    STUCK_PROCESS,
    NETWORK_TIMEOUT,
    RESOURCE_IMBALANCE,
];

/// Scores container metrics against the five heuristic rules
///
/// Thresholds and weights are fixed for the engine's lifetime.
#[derive(Debug, Clone)]
pub struct HeuristicEngine {
    thresholds: Thresholds,
    weights: RuleWeights,
}

impl HeuristicEngine {
    /// Create an engine, failing fast if the weights do not sum to 1.0
    pub fn new(thresholds: Thresholds, weights: RuleWeights) -> Result<Self, ConfigError> {
        weights.validate()?;
        Ok(Self {
            thresholds,
            weights,
        })
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Run all five rules over one container's series and compose a verdict
    ///
    /// Missing or short series disqualify individual rules (score 0 with a
    /// reason); this function never fails.
    pub fn analyze(&self, bundle: &SeriesBundle, limits: &ResourceLimits) -> Verdict {
        let cfg = &self.thresholds;
        let outcomes = [
            (
                SUSTAINED_LOW_CPU,
                self.weights.sustained_low_cpu,
                sustained_low_cpu::evaluate(bundle, limits, cfg),
            ),
            (
                MEMORY_LEAK,
                self.weights.memory_leak,
                memory_leak::evaluate(bundle, limits, cfg),
            ),
            (
                STUCK_PROCESS,
                self.weights.stuck_process,
                stuck_process::evaluate(bundle, limits, cfg),
            ),
            (
                NETWORK_TIMEOUT,
                self.weights.network_timeout,
                network_timeout::evaluate(bundle, limits, cfg),
            ),
            (
                RESOURCE_IMBALANCE,
                self.weights.resource_imbalance,
                resource_imbalance::evaluate(bundle, limits, cfg),
            ),
        ];

        let composite: f64 = outcomes
            .iter()
            .map(|(_, weight, outcome)| weight * outcome.score)
            .sum::<f64>()
            * 100.0;
        let composite = composite.clamp(0.0, 100.0);

        let per_rule: BTreeMap<String, RuleOutcome> = outcomes
            .into_iter()
            .map(|(name, _, outcome)| (name.to_string(), outcome))
            .collect();

        Verdict {
            composite_score: composite,
            classification: Classification::from_score(composite),
            per_rule,
        }
    }
}

impl Default for HeuristicEngine {
    fn default() -> Self {
        // Built-in defaults satisfy the weight invariant by construction
        Self {
            thresholds: Thresholds::default(),
            weights: RuleWeights::default(),
        }
    }
}
