use super::super::catalog::SignalCatalog;
use super::super::domain::{DialogueScript, OptionEffect, SelectionSet};
use super::config::ScoringConfig;

/// Weakest beats of a completed assessment run, original line indices,
/// weakest first. Signals already at the maximum are never flagged, so the
/// result is empty for a perfect run. The sort is stable: ties keep catalog
/// order, which makes remediation order deterministic.
pub(crate) fn flag_assessment(
    selections: &SelectionSet,
    catalog: &SignalCatalog,
    config: &ScoringConfig,
) -> Vec<usize> {
    let mut scored: Vec<(usize, u8)> = catalog
        .signals()
        .iter()
        .filter_map(|signal| signal.line_index)
        .map(|line_index| {
            let score = selections
                .choice(line_index)
                .map(|option_index| catalog.score_for(line_index, option_index))
                .unwrap_or(0);
            (line_index, score)
        })
        .filter(|(_, score)| *score < config.max_signal_score)
        .collect();

    scored.sort_by_key(|(_, score)| *score);
    scored
        .into_iter()
        .take(config.rerun_limit)
        .map(|(line_index, _)| line_index)
        .collect()
}

/// Continuous variant: ranks lines by the chosen option's total signed
/// effect, flagging those that fell short of the best option on the line.
pub(crate) fn flag_continuous(
    script: &DialogueScript,
    selections: &SelectionSet,
    config: &ScoringConfig,
) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = script
        .lines
        .iter()
        .enumerate()
        .filter_map(|(line_index, line)| {
            let option_index = selections.choice(line_index)?;
            let chosen = total_effect(&line.options[option_index].effect);
            let best = line
                .options
                .iter()
                .map(|option| total_effect(&option.effect))
                .fold(f64::NEG_INFINITY, f64::max);
            if chosen < best {
                Some((line_index, chosen))
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(config.rerun_limit)
        .map(|(line_index, _)| line_index)
        .collect()
}

fn total_effect(effect: &OptionEffect) -> f64 {
    match effect {
        OptionEffect::Continuous { effects } => effects.values().sum(),
        OptionEffect::Discrete { score } => *score as f64,
    }
}
