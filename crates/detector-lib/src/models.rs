//! Core data model for zombie container analysis

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Composite score at or above which a container is classified as a zombie
pub const ZOMBIE_SCORE: f64 = 70.0;

/// Composite score at or above which a container is a potential zombie
pub const POTENTIAL_ZOMBIE_SCORE: f64 = 40.0;

/// Single time-stamped measurement for one metric channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix timestamp in seconds
    pub timestamp: i64,
    pub value: f64,
}

/// Time-ordered samples for one metric channel over an analysis window
///
/// Timestamps are non-decreasing. A series may be empty when the metrics
/// backend returned no data for the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub samples: Vec<Sample>,
}

impl Series {
    pub fn new(samples: Vec<Sample>) -> Self {
        debug_assert!(
            samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "series timestamps must be non-decreasing"
        );
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean of the sample values, `None` for an empty series
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.value).sum();
        Some(sum / self.samples.len() as f64)
    }
}

/// The four metric channels analyzed per container
///
/// CPU and network values are rates (cores, bytes/sec); memory is absolute
/// bytes. Each channel may be empty independently of the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesBundle {
    pub cpu: Series,
    pub memory: Series,
    pub network_rx: Series,
    pub network_tx: Series,
}

/// Configured resource limits for a container
///
/// A zero field means the limit is unknown or unset, not a literal zero;
/// rules must never divide by it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub cpu_limit_cores: f64,
    pub memory_limit_bytes: f64,
}

/// Supporting facts attached to a rule outcome
///
/// BTreeMap keeps rendered JSON stable across runs.
pub type Evidence = BTreeMap<String, serde_json::Value>;

/// Result of a single heuristic rule
///
/// `score` is in [0, 1]. A zero score from missing or disqualifying data
/// always carries a `reason` entry in the evidence; a positive score carries
/// the quantitative facts that produced it. Evidence is for operators and
/// debugging only and is never consumed by downstream logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub score: f64,
    pub evidence: Evidence,
}

impl RuleOutcome {
    /// Zero score with an explanatory reason
    pub fn disqualified(reason: &str) -> Self {
        Self::disqualified_with(reason, Evidence::new())
    }

    /// Zero score with a reason plus the facts computed before disqualifying
    pub fn disqualified_with(reason: &str, mut evidence: Evidence) -> Self {
        evidence.insert("reason".to_string(), serde_json::Value::from(reason));
        Self {
            score: 0.0,
            evidence,
        }
    }

    pub fn scored(score: f64, evidence: Evidence) -> Self {
        Self { score, evidence }
    }
}

/// Three-way classification derived from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Normal,
    PotentialZombie,
    Zombie,
}

impl Classification {
    /// Classify a composite score: `>= 70` zombie, `>= 40` potential, else normal
    pub fn from_score(composite: f64) -> Self {
        if composite >= ZOMBIE_SCORE {
            Classification::Zombie
        } else if composite >= POTENTIAL_ZOMBIE_SCORE {
            Classification::PotentialZombie
        } else {
            Classification::Normal
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Normal => write!(f, "normal"),
            Classification::PotentialZombie => write!(f, "potential_zombie"),
            Classification::Zombie => write!(f, "zombie"),
        }
    }
}

/// Full analysis result for one container, recomputed fresh on every call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Weighted composite score in [0, 100]
    pub composite_score: f64,
    pub classification: Classification,
    /// Outcome of every rule, keyed by rule name
    pub per_rule: BTreeMap<String, RuleOutcome>,
}

/// Identity of a workload container
///
/// Used only for filtering and labeling; the scoring engine never interprets
/// these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRef {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub node: String,
}

impl std::fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.pod, self.container)
    }
}

/// A container together with its verdict, as returned by a detection sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub container: ContainerRef,
    pub verdict: Verdict,
}
