use super::super::catalog::SignalCatalog;
use super::super::domain::{DialogueScript, OptionEffect, SelectionSet};
use super::config::ScoringConfig;
use super::{ScoreSnapshot, SignalScore};

/// One decimal place, half away from zero: 0.75 -> 0.8, -0.75 -> -0.8.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Continuous model: per catalog signal, arithmetic mean over the lines
/// whose chosen option defines that signal. Signals with no contributing
/// lines score 0.
pub(crate) fn continuous_snapshot(
    script: &DialogueScript,
    selections: &SelectionSet,
    catalog: &SignalCatalog,
    config: &ScoringConfig,
) -> ScoreSnapshot {
    let mut values = Vec::with_capacity(catalog.signal_count());
    let mut total = 0.0;

    for signal in catalog.signals() {
        let mut sum = 0.0;
        let mut contributors = 0usize;
        for (line_index, line) in script.lines.iter().enumerate() {
            let Some(option_index) = selections.choice(line_index) else {
                continue;
            };
            if let OptionEffect::Continuous { effects } = &line.options[option_index].effect {
                if let Some(effect) = effects.get(&signal.key) {
                    sum += effect;
                    contributors += 1;
                }
            }
        }
        let value = if contributors == 0 {
            0.0
        } else {
            round1(sum / contributors as f64)
        };
        total += value;
        values.push(SignalScore {
            key: signal.key.clone(),
            value,
        });
    }

    ScoreSnapshot {
        values,
        total: round1(total),
        max: config.continuous_axis_max * catalog.signal_count() as f64,
    }
}

/// Assessment model: each signal maps to exactly one line; its value is the
/// catalog score of the chosen option, or 0 while unanswered. Raw sums, no
/// averaging.
pub(crate) fn assessment_snapshot(
    selections: &SelectionSet,
    catalog: &SignalCatalog,
    config: &ScoringConfig,
) -> ScoreSnapshot {
    let mut values = Vec::with_capacity(catalog.signal_count());
    let mut total = 0.0;

    for signal in catalog.signals() {
        let value = match signal.line_index {
            Some(line_index) => selections
                .choice(line_index)
                .map(|option_index| catalog.score_for(line_index, option_index))
                .unwrap_or(0) as f64,
            None => 0.0,
        };
        total += value;
        values.push(SignalScore {
            key: signal.key.clone(),
            value,
        });
    }

    ScoreSnapshot {
        values,
        total,
        max: (config.max_signal_score as usize * catalog.signal_count()) as f64,
    }
}
