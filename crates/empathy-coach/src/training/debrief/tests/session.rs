use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use super::common::*;
use crate::training::debrief::domain::DebriefPhase;
use crate::training::debrief::service::{
    DebriefService, DebriefServiceError, ScoringMode, TransitionError,
};
use crate::training::debrief::store::PersistedSession;
use crate::training::debrief::DialogueBlueprint;

#[test]
fn advance_is_rejected_while_lines_are_unanswered() {
    let (service, store) = build_service();
    service.answer(0, 0).expect("valid answer");
    let before = store.record(session_key()).expect("answer persisted");

    match service.advance_to_debrief() {
        Err(DebriefServiceError::Transition(TransitionError::IncompleteRun { unanswered })) => {
            assert_eq!(unanswered, 5);
        }
        other => panic!("expected incomplete-run rejection, got {other:?}"),
    }

    let view = service.view();
    assert_eq!(view.phase, DebriefPhase::Run);
    // The rejected transition wrote nothing.
    let after = store.record(session_key()).expect("record still present");
    assert_eq!(before, after);
}

#[test]
fn completed_run_advances_to_debrief() {
    let (service, store) = build_service();
    answer_all_best(&service);

    let view = service.advance_to_debrief().expect("run is complete");

    assert_eq!(view.phase, DebriefPhase::Debrief);
    assert_eq!(view.snapshot.total, 12.0);
    assert!(!view.rerun_available, "perfect run has nothing to re-run");
    let record = store.record(session_key()).expect("transition persisted");
    assert_eq!(record.phase, DebriefPhase::Debrief);
}

#[test]
fn rerun_is_unavailable_after_a_perfect_run() {
    let (service, _) = build_service();
    answer_all_best(&service);
    service.advance_to_debrief().expect("run is complete");

    match service.begin_rerun() {
        Err(DebriefServiceError::Transition(TransitionError::RerunUnavailable)) => {}
        other => panic!("expected re-run to be unavailable, got {other:?}"),
    }
    assert_eq!(service.view().phase, DebriefPhase::Debrief);
}

#[test]
fn rerun_flow_produces_a_delta() {
    let (service, _) = build_service();
    answer_with_two_weak_beats(&service);
    let debrief = service.advance_to_debrief().expect("run is complete");

    assert!(debrief.rerun_available);
    let flagged: Vec<usize> = debrief.flagged.iter().map(|line| line.line_index).collect();
    assert_eq!(flagged, vec![3, 5]);

    service.begin_rerun().expect("weak points exist");
    service.answer_rerun(3, 0).expect("line 3 is flagged");
    service.answer_rerun(5, 0).expect("line 5 is flagged");
    let view = service.complete_rerun().expect("both flagged lines answered");

    assert_eq!(view.phase, DebriefPhase::Debrief);
    assert!(view.rerun_complete);
    let delta = view.delta.expect("complete re-run yields a delta");
    let respect = delta
        .iter()
        .find(|entry| entry.key.as_str() == "respect")
        .expect("respect delta present");
    assert_eq!(respect.change, 2.0);
    let framing = delta
        .iter()
        .find(|entry| entry.key.as_str() == "constructive_framing")
        .expect("framing delta present");
    assert_eq!(framing.change, 1.0);
}

#[test]
fn rerun_rejects_unflagged_lines_and_partial_completion() {
    let (service, _) = build_service();
    answer_with_two_weak_beats(&service);
    service.advance_to_debrief().expect("run is complete");
    service.begin_rerun().expect("weak points exist");

    match service.answer_rerun(0, 0) {
        Err(DebriefServiceError::Transition(TransitionError::LineNotFlagged { line_index })) => {
            assert_eq!(line_index, 0);
        }
        other => panic!("expected unflagged rejection, got {other:?}"),
    }

    service.answer_rerun(3, 0).expect("line 3 is flagged");
    match service.complete_rerun() {
        Err(DebriefServiceError::Transition(TransitionError::IncompleteRerun { remaining })) => {
            assert_eq!(remaining, 1);
        }
        other => panic!("expected incomplete re-run rejection, got {other:?}"),
    }
    assert_eq!(service.view().phase, DebriefPhase::Rerun);
}

#[test]
fn backing_out_keeps_partial_answers_without_completing() {
    let (service, _) = build_service();
    answer_with_two_weak_beats(&service);
    service.advance_to_debrief().expect("run is complete");
    service.begin_rerun().expect("weak points exist");
    service.answer_rerun(3, 0).expect("line 3 is flagged");

    let view = service.back_out().expect("back-out is always allowed mid-rerun");

    assert_eq!(view.phase, DebriefPhase::Debrief);
    assert_eq!(view.rerun_answered, 1);
    assert!(!view.rerun_complete);
    assert!(view.delta.is_none(), "partial re-run must not expose a delta");
}

#[test]
fn beginning_a_rerun_discards_previous_rerun_answers() {
    let (service, _) = build_service();
    answer_with_two_weak_beats(&service);
    service.advance_to_debrief().expect("run is complete");
    service.begin_rerun().expect("weak points exist");
    service.answer_rerun(3, 0).expect("line 3 is flagged");
    service.back_out().expect("back out");

    let view = service.begin_rerun().expect("weak points still exist");
    assert_eq!(view.rerun_answered, 0);
}

#[test]
fn restart_clears_state_and_deletes_the_record() {
    let (service, store) = build_service();
    answer_with_two_weak_beats(&service);
    service.advance_to_debrief().expect("run is complete");

    let view = service.restart();

    assert_eq!(view.phase, DebriefPhase::Run);
    assert_eq!(view.answered, 0);
    assert!(store.record(session_key()).is_none());
}

#[test]
fn session_resumes_from_a_persisted_record() {
    let (service, store) = build_service();
    answer_with_two_weak_beats(&service);
    service.advance_to_debrief().expect("run is complete");
    let expected = service.view();

    // A fresh service over the same store picks the session back up.
    let (script, catalog) = DialogueBlueprint::assessment();
    let resumed = DebriefService::new(
        script,
        catalog,
        ScoringMode::Assessment,
        scoring_config(),
        store.clone(),
    )
    .expect("blueprint script validates");
    assert!(resumed.resume());

    let view = resumed.view();
    assert_eq!(view.phase, DebriefPhase::Debrief);
    assert_eq!(view.snapshot, expected.snapshot);
    assert_eq!(
        view.flagged.iter().map(|line| line.line_index).collect::<Vec<_>>(),
        vec![3, 5]
    );
}

#[test]
fn inconsistent_records_fall_back_to_a_fresh_run() {
    let (service, store) = build_service();

    store.insert(
        session_key(),
        PersistedSession {
            phase: DebriefPhase::Debrief,
            run_selections: vec![Some(0); 3], // wrong length for a 6-line script
            rerun_selections: BTreeMap::new(),
            reflection_notes: None,
            saved_at: Utc::now(),
        },
    );

    assert!(!service.resume());
    let view = service.view();
    assert_eq!(view.phase, DebriefPhase::Run);
    assert_eq!(view.answered, 0);
}

#[test]
fn debrief_phase_with_incomplete_run_is_treated_as_corrupt() {
    let (service, store) = build_service();

    let mut run_selections = vec![Some(0); 6];
    run_selections[2] = None;
    store.insert(
        session_key(),
        PersistedSession {
            phase: DebriefPhase::Debrief,
            run_selections,
            rerun_selections: BTreeMap::new(),
            reflection_notes: None,
            saved_at: Utc::now(),
        },
    );

    assert!(!service.resume());
    assert_eq!(service.view().phase, DebriefPhase::Run);
}

#[test]
fn store_failures_never_reach_the_trainee() {
    let store = Arc::new(UnavailableStore);
    let (script, catalog) = DialogueBlueprint::assessment();
    let service = DebriefService::new(
        script,
        catalog,
        ScoringMode::Assessment,
        scoring_config(),
        store,
    )
    .expect("blueprint script validates");

    // Every write fails underneath; the flow must be unaffected.
    for line_index in 0..service.script().line_count() {
        service.answer(line_index, 0).expect("answer succeeds");
    }
    let view = service.advance_to_debrief().expect("transition succeeds");
    assert_eq!(view.phase, DebriefPhase::Debrief);
    assert!(!service.resume());
}

#[test]
fn reflection_notes_travel_with_the_session() {
    let (service, store) = build_service();
    answer_all_best(&service);
    service.advance_to_debrief().expect("run is complete");

    let view = service
        .set_reflection_notes(Some("listen before fixing".to_string()))
        .expect("notes are accepted during the debrief");

    assert_eq!(view.reflection_notes.as_deref(), Some("listen before fixing"));
    let record = store.record(session_key()).expect("notes persisted");
    assert_eq!(record.reflection_notes.as_deref(), Some("listen before fixing"));
}

#[test]
fn reflection_notes_are_rejected_before_the_debrief() {
    let (service, store) = build_service();
    service.answer(0, 0).expect("valid answer");

    match service.set_reflection_notes(Some("too early".to_string())) {
        Err(DebriefServiceError::Transition(TransitionError::WrongPhase { expected, actual })) => {
            assert_eq!(expected, "debrief");
            assert_eq!(actual, "run");
        }
        other => panic!("expected wrong-phase rejection, got {other:?}"),
    }

    let record = store.record(session_key()).expect("record present");
    assert_eq!(record.reflection_notes, None);
}

#[test]
fn answers_are_rejected_outside_the_run_phase() {
    let (service, _) = build_service();
    answer_all_best(&service);
    service.advance_to_debrief().expect("run is complete");

    match service.answer(0, 1) {
        Err(DebriefServiceError::Transition(TransitionError::WrongPhase { expected, actual })) => {
            assert_eq!(expected, "run");
            assert_eq!(actual, "debrief");
        }
        other => panic!("expected wrong-phase rejection, got {other:?}"),
    }
}
