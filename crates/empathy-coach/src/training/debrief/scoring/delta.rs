use serde::{Deserialize, Serialize};

use super::super::domain::SignalKey;
use super::aggregate::round1;
use super::ScoreSnapshot;

/// Signed per-signal change between two snapshots of the same catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDelta {
    pub key: SignalKey,
    pub change: f64,
}

/// `updated - original` per signal, one decimal place. Signals missing from
/// either snapshot default to 0 before subtracting; neither input is
/// mutated. Keys follow the original snapshot's order, with any
/// updated-only keys appended.
pub(crate) fn delta(original: &ScoreSnapshot, updated: &ScoreSnapshot) -> Vec<SignalDelta> {
    let mut deltas: Vec<SignalDelta> = original
        .values
        .iter()
        .map(|score| SignalDelta {
            key: score.key.clone(),
            change: round1(updated.value_for(&score.key) - score.value),
        })
        .collect();

    for score in &updated.values {
        if !original.values.iter().any(|entry| entry.key == score.key) {
            deltas.push(SignalDelta {
                key: score.key.clone(),
                change: round1(score.value),
            });
        }
    }

    deltas
}
