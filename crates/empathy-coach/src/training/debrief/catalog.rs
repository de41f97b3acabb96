use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{DialogueScript, OptionEffect, ScriptError, SignalKey};

/// One named behavioral dimension. In the assessment model a signal is bound
/// to exactly one line; in the continuous model `line_index` is `None` and
/// effects come from the options themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDefinition {
    pub key: SignalKey,
    pub label: String,
    pub abbreviation: String,
    pub description: String,
    pub line_index: Option<usize>,
}

/// Fixed registry of the signals a script is scored against. Insertion order
/// is significant: it drives display order and radar-chart axes, and it is
/// the tie-breaker when weak points are ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalCatalog {
    signals: Vec<SignalDefinition>,
    score_tables: BTreeMap<usize, Vec<u8>>,
}

impl SignalCatalog {
    pub fn new(signals: Vec<SignalDefinition>) -> Self {
        Self {
            signals,
            score_tables: BTreeMap::new(),
        }
    }

    /// The catalog's signals in display order.
    pub fn signals(&self) -> &[SignalDefinition] {
        &self.signals
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SignalKey> {
        self.signals.iter().map(|signal| &signal.key)
    }

    /// Attach a positional option-score table for one line, for providers
    /// that configure scores separately from the script.
    pub fn with_score_table(mut self, line_index: usize, table: Vec<u8>) -> Self {
        self.score_tables.insert(line_index, table);
        self
    }

    /// Derive score tables from the script's discrete options so the table
    /// and the option order share one source of truth.
    pub fn bind_script(mut self, script: &DialogueScript) -> Self {
        for (line_index, line) in script.lines.iter().enumerate() {
            let scores: Vec<u8> = line
                .options
                .iter()
                .filter_map(|option| match option.effect {
                    OptionEffect::Discrete { score } => Some(score),
                    OptionEffect::Continuous { .. } => None,
                })
                .collect();
            if scores.len() == line.options.len() && !scores.is_empty() {
                self.score_tables.insert(line_index, scores);
            }
        }
        self
    }

    /// Score for one chosen option. Out-of-catalog lines and out-of-table
    /// option indices resolve to 0 so totals stay well-defined even with
    /// partial configuration.
    pub fn score_for(&self, line_index: usize, option_index: usize) -> u8 {
        self.score_tables
            .get(&line_index)
            .and_then(|table| table.get(option_index))
            .copied()
            .unwrap_or(0)
    }

    /// Startup validation pass: every bound line exists, every score table
    /// matches its line's option count, and no score exceeds the per-signal
    /// maximum.
    pub fn validate(&self, script: &DialogueScript, max_signal_score: u8) -> Result<(), ScriptError> {
        if script.lines.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        for (line_index, line) in script.lines.iter().enumerate() {
            if line.options.is_empty() {
                return Err(ScriptError::EmptyLine { line_index });
            }
            let discrete = line
                .options
                .iter()
                .filter(|option| matches!(option.effect, OptionEffect::Discrete { .. }))
                .count();
            if discrete != 0 && discrete != line.options.len() {
                return Err(ScriptError::MixedEffectModes { line_index });
            }
        }
        for signal in &self.signals {
            if let Some(line_index) = signal.line_index {
                if script.line(line_index).is_none() {
                    return Err(ScriptError::DanglingSignalBinding {
                        signal: signal.key.as_str().to_string(),
                        line_index,
                    });
                }
            }
        }
        for (line_index, table) in &self.score_tables {
            let line = script
                .line(*line_index)
                .ok_or(ScriptError::OrphanScoreTable {
                    line_index: *line_index,
                })?;
            if table.len() != line.options.len() {
                return Err(ScriptError::ScoreTableMismatch {
                    line_index: *line_index,
                    table_len: table.len(),
                    option_count: line.options.len(),
                });
            }
            if let Some(score) = table.iter().find(|score| **score > max_signal_score) {
                return Err(ScriptError::ScoreAboveMaximum {
                    line_index: *line_index,
                    score: *score,
                    max: max_signal_score,
                });
            }
        }
        Ok(())
    }
}
