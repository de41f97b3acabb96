use serde::{Deserialize, Serialize};

/// Tunables for the scoring engine and weak-point policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Top score one option can earn for its bound signal in the
    /// assessment model.
    pub max_signal_score: u8,
    /// Number of weakest beats offered for remediation.
    pub rerun_limit: usize,
    /// Radar-axis ceiling per signal in the continuous model; only feeds
    /// the snapshot's reported maximum.
    pub continuous_axis_max: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_signal_score: 2,
            rerun_limit: 2,
            continuous_axis_max: 2.0,
        }
    }
}
