use super::common::*;
use crate::training::debrief::domain::SelectionSet;
use crate::training::debrief::scoring::{ScoringConfig, ScoringEngine};
use crate::training::debrief::DialogueBlueprint;

#[test]
fn perfect_run_flags_nothing() {
    let engine = assessment_engine();
    let (script, _) = DialogueBlueprint::assessment();

    let mut selections = SelectionSet::empty(&script);
    for line_index in 0..script.line_count() {
        selections.select(&script, line_index, 0).unwrap();
    }

    assert!(engine.weak_points(&selections).is_empty());
}

#[test]
fn weakest_beats_come_back_in_score_order() {
    let engine = assessment_engine();
    let (script, _) = DialogueBlueprint::assessment();

    // Line 3 scores 0, line 5 scores 1, everything else 2.
    let mut selections = SelectionSet::empty(&script);
    for line_index in 0..script.line_count() {
        let option_index = match line_index {
            3 => 2,
            5 => 1,
            _ => 0,
        };
        selections.select(&script, line_index, option_index).unwrap();
    }

    assert_eq!(engine.weak_points(&selections), vec![3, 5]);
}

#[test]
fn ties_keep_catalog_order() {
    let engine = assessment_engine();
    let (script, _) = DialogueBlueprint::assessment();

    // Lines 1 and 4 both score 1; the earlier catalog entry must win the tie
    // every time.
    let mut selections = SelectionSet::empty(&script);
    for line_index in 0..script.line_count() {
        let option_index = match line_index {
            1 | 4 => 1,
            _ => 0,
        };
        selections.select(&script, line_index, option_index).unwrap();
    }

    for _ in 0..10 {
        assert_eq!(engine.weak_points(&selections), vec![1, 4]);
    }
}

#[test]
fn rerun_limit_caps_the_flagged_set() {
    let (_, catalog) = DialogueBlueprint::assessment();
    let engine = ScoringEngine::new(
        catalog,
        ScoringConfig {
            rerun_limit: 2,
            ..ScoringConfig::default()
        },
    );
    let (script, _) = DialogueBlueprint::assessment();

    // Three lines below maximum; only the two weakest come back.
    let mut selections = SelectionSet::empty(&script);
    for line_index in 0..script.line_count() {
        let option_index = match line_index {
            0 => 2, // score 0
            2 => 1, // score 1
            4 => 1, // score 1
            _ => 0,
        };
        selections.select(&script, line_index, option_index).unwrap();
    }

    assert_eq!(engine.weak_points(&selections), vec![0, 2]);
}

#[test]
fn continuous_variant_ranks_by_total_line_effect() {
    let (script, catalog) = warmth_script();
    let engine = ScoringEngine::new(catalog, scoring_config());

    // Line 1 and line 4 both take the weaker option; line 4's shortfall is
    // ranked by chosen total, so line 1 (total 0.0) and line 4 (total 0.0)
    // tie and keep line order. Line 2 takes its best option and is not
    // flagged.
    let mut selections = SelectionSet::empty(&script);
    selections.select(&script, 0, 0).unwrap();
    selections.select(&script, 1, 1).unwrap();
    selections.select(&script, 2, 1).unwrap();
    selections.select(&script, 3, 0).unwrap();
    selections.select(&script, 4, 1).unwrap();

    let flagged = engine.weak_points_continuous(&script, &selections);
    assert_eq!(flagged, vec![1, 4]);
}

#[test]
fn continuous_variant_skips_best_choices() {
    let (script, catalog) = warmth_script();
    let engine = ScoringEngine::new(catalog, scoring_config());

    let mut selections = SelectionSet::empty(&script);
    selections.select(&script, 0, 0).unwrap();
    selections.select(&script, 1, 0).unwrap();
    selections.select(&script, 2, 1).unwrap();
    selections.select(&script, 3, 0).unwrap();
    selections.select(&script, 4, 0).unwrap();

    let flagged = engine.weak_points_continuous(&script, &selections);
    assert!(flagged.is_empty());
}
