mod aggregate;
mod config;
mod delta;
mod weak_points;

pub use config::ScoringConfig;
pub use delta::SignalDelta;

use serde::{Deserialize, Serialize};

use super::catalog::SignalCatalog;
use super::domain::{DialogueScript, SelectionSet, SignalKey};

/// Stateless scorer binding a signal catalog and its tunables. All methods
/// are pure functions of the selection set they are given.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    catalog: SignalCatalog,
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(catalog: SignalCatalog, config: ScoringConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &SignalCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Continuous coaching model: per-signal averages over contributing
    /// lines, rounded to one decimal place.
    pub fn continuous_snapshot(
        &self,
        script: &DialogueScript,
        selections: &SelectionSet,
    ) -> ScoreSnapshot {
        aggregate::continuous_snapshot(script, selections, &self.catalog, &self.config)
    }

    /// Assessment model: raw 0-2 per bound signal, summed.
    pub fn assessment_snapshot(&self, selections: &SelectionSet) -> ScoreSnapshot {
        aggregate::assessment_snapshot(selections, &self.catalog, &self.config)
    }

    /// Lowest-scoring beats of an assessment run, weakest first.
    pub fn weak_points(&self, selections: &SelectionSet) -> Vec<usize> {
        weak_points::flag_assessment(selections, &self.catalog, &self.config)
    }

    /// Continuous-model remediation candidates, ranked by total line effect.
    pub fn weak_points_continuous(
        &self,
        script: &DialogueScript,
        selections: &SelectionSet,
    ) -> Vec<usize> {
        weak_points::flag_continuous(script, selections, &self.config)
    }

    /// Per-signal change between two snapshots, `updated - original`.
    pub fn delta(&self, original: &ScoreSnapshot, updated: &ScoreSnapshot) -> Vec<SignalDelta> {
        delta::delta(original, updated)
    }
}

/// Derived per-signal values for one selection set, recomputed on every
/// change and never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub values: Vec<SignalScore>,
    pub total: f64,
    pub max: f64,
}

impl ScoreSnapshot {
    /// Value for one signal; absent signals read as 0.
    pub fn value_for(&self, key: &SignalKey) -> f64 {
        self.values
            .iter()
            .find(|score| &score.key == key)
            .map(|score| score.value)
            .unwrap_or(0.0)
    }
}

/// One signal's value within a snapshot, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub key: SignalKey,
    pub value: f64,
}
