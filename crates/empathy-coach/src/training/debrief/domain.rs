use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier for a behavioral signal, e.g. `"empathy"` or `"active_listening"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignalKey(pub String);

impl SignalKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An immutable scripted dialogue: an ordered sequence of lines, each with
/// its selectable response options. Defined at configuration time and never
/// mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueScript {
    pub title: String,
    pub lines: Vec<DialogueLine>,
}

impl DialogueScript {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&DialogueLine> {
        self.lines.get(index)
    }
}

/// One scripted utterance the trainee responds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker_role: String,
    pub persona: String,
    pub prompt: String,
    pub coaching_cue: String,
    pub options: Vec<ResponseOption>,
}

/// A selectable response, paired with its scoring effect at configuration
/// time so option order and score tables can never drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOption {
    pub label: String,
    pub effect: OptionEffect,
}

/// Scoring payload attached to a response option, resolved once when the
/// script loads so the aggregator dispatches on an explicit tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OptionEffect {
    /// Signed per-signal effects for the continuous coaching model.
    Continuous { effects: BTreeMap<SignalKey, f64> },
    /// Raw 0-2 score against the line's bound signal in the assessment model.
    Discrete { score: u8 },
}

/// The trainee's chosen option per line for a single pass through a script.
/// Populated entries are guaranteed to index into that line's options; the
/// scoring functions rely on this and do not re-validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSet {
    choices: Vec<Option<usize>>,
}

impl SelectionSet {
    /// An all-unanswered selection set sized to the script.
    pub fn empty(script: &DialogueScript) -> Self {
        Self {
            choices: vec![None; script.line_count()],
        }
    }

    /// Restore from raw choices, re-checking every populated entry against
    /// the script. Used when loading a persisted session.
    pub fn from_choices(
        script: &DialogueScript,
        choices: Vec<Option<usize>>,
    ) -> Result<Self, SelectionError> {
        if choices.len() != script.line_count() {
            return Err(SelectionError::LengthMismatch {
                expected: script.line_count(),
                actual: choices.len(),
            });
        }
        for (line_index, choice) in choices.iter().enumerate() {
            if let Some(option_index) = choice {
                validate_selection(script, line_index, *option_index)?;
            }
        }
        Ok(Self { choices })
    }

    /// Record an answer, rejecting out-of-range indices before they can
    /// reach the scoring path. A set sized for a different script is
    /// rejected outright rather than written past its own length.
    pub fn select(
        &mut self,
        script: &DialogueScript,
        line_index: usize,
        option_index: usize,
    ) -> Result<(), SelectionError> {
        if self.choices.len() != script.line_count() {
            return Err(SelectionError::LengthMismatch {
                expected: script.line_count(),
                actual: self.choices.len(),
            });
        }
        validate_selection(script, line_index, option_index)?;
        self.choices[line_index] = Some(option_index);
        Ok(())
    }

    pub fn choice(&self, line_index: usize) -> Option<usize> {
        self.choices.get(line_index).copied().flatten()
    }

    pub fn choices(&self) -> &[Option<usize>] {
        &self.choices
    }

    pub fn answered_count(&self) -> usize {
        self.choices.iter().filter(|choice| choice.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.choices.iter().all(|choice| choice.is_some())
    }

    pub fn clear(&mut self) {
        for choice in &mut self.choices {
            *choice = None;
        }
    }

    /// Copy with re-run answers laid over the original choices, used to
    /// score the updated state after a remediation pass.
    pub fn overlaid(&self, rerun: &BTreeMap<usize, usize>) -> Self {
        let mut choices = self.choices.clone();
        for (line_index, option_index) in rerun {
            if *line_index < choices.len() {
                choices[*line_index] = Some(*option_index);
            }
        }
        Self { choices }
    }
}

pub(crate) fn validate_selection(
    script: &DialogueScript,
    line_index: usize,
    option_index: usize,
) -> Result<(), SelectionError> {
    let line = script
        .line(line_index)
        .ok_or(SelectionError::LineOutOfRange {
            line_index,
            line_count: script.line_count(),
        })?;
    if option_index >= line.options.len() {
        return Err(SelectionError::OptionOutOfRange {
            line_index,
            option_index,
            option_count: line.options.len(),
        });
    }
    Ok(())
}

/// Rejected trainee input; raised at the point of selection rather than
/// inside the scoring functions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("line {line_index} is out of range for a {line_count}-line script")]
    LineOutOfRange { line_index: usize, line_count: usize },
    #[error("option {option_index} is out of range for line {line_index} ({option_count} options)")]
    OptionOutOfRange {
        line_index: usize,
        option_index: usize,
        option_count: usize,
    },
    #[error("selection set has {actual} entries but the script has {expected} lines")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Phase of the debrief flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebriefPhase {
    Run,
    Debrief,
    Rerun,
}

impl DebriefPhase {
    pub const fn label(self) -> &'static str {
        match self {
            DebriefPhase::Run => "run",
            DebriefPhase::Debrief => "debrief",
            DebriefPhase::Rerun => "rerun",
        }
    }
}

/// Script configuration problems caught by the startup validation pass so
/// they surface in development instead of silently scoring as zero.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("script has no lines")]
    EmptyScript,
    #[error("line {line_index} has no response options")]
    EmptyLine { line_index: usize },
    #[error("signal '{signal}' is bound to missing line {line_index}")]
    DanglingSignalBinding { signal: String, line_index: usize },
    #[error("score table references missing line {line_index}")]
    OrphanScoreTable { line_index: usize },
    #[error("score table for line {line_index} has {table_len} entries but the line has {option_count} options")]
    ScoreTableMismatch {
        line_index: usize,
        table_len: usize,
        option_count: usize,
    },
    #[error("score {score} on line {line_index} exceeds the per-signal maximum {max}")]
    ScoreAboveMaximum {
        line_index: usize,
        score: u8,
        max: u8,
    },
    #[error("line {line_index} mixes continuous and discrete option effects")]
    MixedEffectModes { line_index: usize },
}
