use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::catalog::SignalCatalog;
use super::domain::{
    DebriefPhase, DialogueScript, ScriptError, SelectionError, SelectionSet,
};
use super::scoring::{ScoreSnapshot, ScoringConfig, ScoringEngine, SignalDelta};
use super::store::{PersistedSession, SessionStore, SESSION_KEY};

/// Which scoring model drives the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    Assessment,
    Coaching,
}

/// Orchestrates one trainee's pass through a script: initial run, debrief,
/// optional re-run of the weakest beats, and the comparison between the two.
/// Owns the only mutable session state; the scoring engine underneath is
/// pure. The store is injected and written best-effort on every change so a
/// reload resumes mid-flow.
pub struct DebriefService<S> {
    script: DialogueScript,
    engine: ScoringEngine,
    mode: ScoringMode,
    store: Arc<S>,
    state: Mutex<SessionState>,
}

#[derive(Debug)]
struct SessionState {
    phase: DebriefPhase,
    run: SelectionSet,
    rerun: BTreeMap<usize, usize>,
    reflection_notes: Option<String>,
}

impl<S> DebriefService<S>
where
    S: SessionStore + 'static,
{
    /// Build a service over a validated script. Configuration problems are
    /// surfaced here, at startup, rather than silently scoring as zero at
    /// runtime.
    pub fn new(
        script: DialogueScript,
        catalog: SignalCatalog,
        mode: ScoringMode,
        config: ScoringConfig,
        store: Arc<S>,
    ) -> Result<Self, ScriptError> {
        catalog.validate(&script, config.max_signal_score)?;
        let run = SelectionSet::empty(&script);
        Ok(Self {
            script,
            engine: ScoringEngine::new(catalog, config),
            mode,
            store,
            state: Mutex::new(SessionState {
                phase: DebriefPhase::Run,
                run,
                rerun: BTreeMap::new(),
                reflection_notes: None,
            }),
        })
    }

    pub fn script(&self) -> &DialogueScript {
        &self.script
    }

    /// Restore a previously persisted session. Absent, malformed, or
    /// inconsistent records mean "start fresh"; this never fails the caller.
    /// Returns whether a session was restored.
    pub fn resume(&self) -> bool {
        let record = match self.store.load(SESSION_KEY) {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(error) => {
                warn!(%error, "session store unreadable, starting fresh");
                return false;
            }
        };

        let run = match SelectionSet::from_choices(&self.script, record.run_selections) {
            Ok(run) => run,
            Err(error) => {
                warn!(%error, "persisted run selections do not fit the script, starting fresh");
                return false;
            }
        };

        // A debrief or re-run phase without a complete initial run cannot
        // have happened through legal transitions.
        if record.phase != DebriefPhase::Run && !run.is_complete() {
            warn!("persisted phase is inconsistent with an incomplete run, starting fresh");
            return false;
        }

        let flagged = self.weak_points_for(&run);
        let mut rerun = BTreeMap::new();
        for (line_index, option_index) in record.rerun_selections {
            if !flagged.contains(&line_index) {
                warn!(line_index, "persisted re-run answer targets an unflagged line, starting fresh");
                return false;
            }
            if super::domain::validate_selection(&self.script, line_index, option_index).is_err() {
                warn!(line_index, "persisted re-run answer is out of range, starting fresh");
                return false;
            }
            rerun.insert(line_index, option_index);
        }

        let phase = if record.phase == DebriefPhase::Rerun && flagged.is_empty() {
            DebriefPhase::Debrief
        } else {
            record.phase
        };

        let mut state = self.lock();
        state.phase = phase;
        state.run = run;
        state.rerun = rerun;
        state.reflection_notes = record.reflection_notes;
        true
    }

    /// Record an answer for the initial run.
    pub fn answer(
        &self,
        line_index: usize,
        option_index: usize,
    ) -> Result<DebriefView, DebriefServiceError> {
        let mut state = self.lock();
        self.require_phase(&state, DebriefPhase::Run)?;
        state.run.select(&self.script, line_index, option_index)?;
        self.persist(&state);
        Ok(self.view_locked(&state))
    }

    /// `RUN -> DEBRIEF`, legal only once every line has an answer.
    pub fn advance_to_debrief(&self) -> Result<DebriefView, DebriefServiceError> {
        let mut state = self.lock();
        self.require_phase(&state, DebriefPhase::Run)?;
        if !state.run.is_complete() {
            let unanswered = self.script.line_count() - state.run.answered_count();
            return Err(TransitionError::IncompleteRun { unanswered }.into());
        }
        state.phase = DebriefPhase::Debrief;
        self.persist(&state);
        Ok(self.view_locked(&state))
    }

    /// `DEBRIEF -> RERUN`, legal only when weak points exist. Any previous
    /// re-run answers are discarded.
    pub fn begin_rerun(&self) -> Result<DebriefView, DebriefServiceError> {
        let mut state = self.lock();
        self.require_phase(&state, DebriefPhase::Debrief)?;
        if self.weak_points_for(&state.run).is_empty() {
            return Err(TransitionError::RerunUnavailable.into());
        }
        state.rerun.clear();
        state.phase = DebriefPhase::Rerun;
        self.persist(&state);
        Ok(self.view_locked(&state))
    }

    /// Record an answer for a flagged line during the re-run.
    pub fn answer_rerun(
        &self,
        line_index: usize,
        option_index: usize,
    ) -> Result<DebriefView, DebriefServiceError> {
        let mut state = self.lock();
        self.require_phase(&state, DebriefPhase::Rerun)?;
        if !self.weak_points_for(&state.run).contains(&line_index) {
            return Err(TransitionError::LineNotFlagged { line_index }.into());
        }
        super::domain::validate_selection(&self.script, line_index, option_index)?;
        state.rerun.insert(line_index, option_index);
        self.persist(&state);
        Ok(self.view_locked(&state))
    }

    /// `RERUN -> DEBRIEF` once every flagged line has a re-run answer.
    pub fn complete_rerun(&self) -> Result<DebriefView, DebriefServiceError> {
        let mut state = self.lock();
        self.require_phase(&state, DebriefPhase::Rerun)?;
        let flagged = self.weak_points_for(&state.run);
        let remaining = flagged
            .iter()
            .filter(|line_index| !state.rerun.contains_key(line_index))
            .count();
        if remaining > 0 {
            return Err(TransitionError::IncompleteRerun { remaining }.into());
        }
        state.phase = DebriefPhase::Debrief;
        self.persist(&state);
        Ok(self.view_locked(&state))
    }

    /// Leave the re-run early. Answers already entered are kept for display
    /// but the re-run is not treated as complete.
    pub fn back_out(&self) -> Result<DebriefView, DebriefServiceError> {
        let mut state = self.lock();
        self.require_phase(&state, DebriefPhase::Rerun)?;
        state.phase = DebriefPhase::Debrief;
        self.persist(&state);
        Ok(self.view_locked(&state))
    }

    /// Clear everything, return to `RUN`, and delete the persisted record.
    /// Legal from any phase.
    pub fn restart(&self) -> DebriefView {
        let mut state = self.lock();
        state.phase = DebriefPhase::Run;
        state.run.clear();
        state.rerun.clear();
        state.reflection_notes = None;
        if let Err(error) = self.store.delete(SESSION_KEY) {
            warn!(%error, "failed to delete persisted session");
        }
        self.view_locked(&state)
    }

    /// Attach free-text reflection notes to a finished run; they travel
    /// with the persisted session and the exported snapshot. Only legal
    /// during the debrief.
    pub fn set_reflection_notes(
        &self,
        notes: Option<String>,
    ) -> Result<DebriefView, DebriefServiceError> {
        let mut state = self.lock();
        self.require_phase(&state, DebriefPhase::Debrief)?;
        state.reflection_notes = notes;
        self.persist(&state);
        Ok(self.view_locked(&state))
    }

    /// Current derived state for the presentation layer.
    pub fn view(&self) -> DebriefView {
        let state = self.lock();
        self.view_locked(&state)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session mutex poisoned")
    }

    fn require_phase(
        &self,
        state: &SessionState,
        expected: DebriefPhase,
    ) -> Result<(), TransitionError> {
        if state.phase == expected {
            Ok(())
        } else {
            Err(TransitionError::WrongPhase {
                expected: expected.label(),
                actual: state.phase.label(),
            })
        }
    }

    fn snapshot_for(&self, selections: &SelectionSet) -> ScoreSnapshot {
        match self.mode {
            ScoringMode::Assessment => self.engine.assessment_snapshot(selections),
            ScoringMode::Coaching => self.engine.continuous_snapshot(&self.script, selections),
        }
    }

    fn weak_points_for(&self, selections: &SelectionSet) -> Vec<usize> {
        if !selections.is_complete() {
            return Vec::new();
        }
        match self.mode {
            ScoringMode::Assessment => self.engine.weak_points(selections),
            ScoringMode::Coaching => {
                self.engine.weak_points_continuous(&self.script, selections)
            }
        }
    }

    fn view_locked(&self, state: &SessionState) -> DebriefView {
        let snapshot = self.snapshot_for(&state.run);
        let flagged = self.weak_points_for(&state.run);
        let rerun_complete = !flagged.is_empty()
            && flagged
                .iter()
                .all(|line_index| state.rerun.contains_key(line_index));

        // The comparison is only derivable once the re-run covers every
        // flagged line; a partial re-run never produces a delta.
        let delta = if rerun_complete {
            let updated = self.snapshot_for(&state.run.overlaid(&state.rerun));
            Some(self.engine.delta(&snapshot, &updated))
        } else {
            None
        };

        let current_line = match state.phase {
            DebriefPhase::Run => state
                .run
                .choices()
                .iter()
                .position(|choice| choice.is_none()),
            DebriefPhase::Rerun => flagged
                .iter()
                .find(|line_index| !state.rerun.contains_key(line_index))
                .copied(),
            DebriefPhase::Debrief => None,
        }
        .map(|line_index| self.line_view(line_index));

        let flagged_views = flagged
            .iter()
            .map(|line_index| self.line_view(*line_index))
            .collect();

        DebriefView {
            phase: state.phase,
            line_count: self.script.line_count(),
            answered: state.run.answered_count(),
            current_line,
            snapshot,
            flagged: flagged_views,
            rerun_available: !flagged.is_empty(),
            rerun_answered: state.rerun.len(),
            rerun_complete,
            delta,
            reflection_notes: state.reflection_notes.clone(),
        }
    }

    fn line_view(&self, line_index: usize) -> LineView {
        let line = &self.script.lines[line_index];
        LineView {
            line_index,
            speaker_role: line.speaker_role.clone(),
            persona: line.persona.clone(),
            prompt: line.prompt.clone(),
            coaching_cue: line.coaching_cue.clone(),
            options: line.options.iter().map(|option| option.label.clone()).collect(),
        }
    }

    fn persist(&self, state: &SessionState) {
        let record = PersistedSession {
            phase: state.phase,
            run_selections: state.run.choices().to_vec(),
            rerun_selections: state.rerun.clone(),
            reflection_notes: state.reflection_notes.clone(),
            saved_at: Utc::now(),
        };
        // Losing resume state is not a correctness violation; the trainee
        // can still finish the session from memory.
        if let Err(error) = self.store.save(SESSION_KEY, &record) {
            warn!(%error, "failed to persist debrief session");
        }
    }
}

/// Rejected phase transition; the session is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot enter debrief with {unanswered} unanswered line(s)")]
    IncompleteRun { unanswered: usize },
    #[error("every signal is already at maximum, no re-run available")]
    RerunUnavailable,
    #[error("action requires the '{expected}' phase but the session is in '{actual}'")]
    WrongPhase {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("line {line_index} is not flagged for re-run")]
    LineNotFlagged { line_index: usize },
    #[error("re-run still has {remaining} unanswered line(s)")]
    IncompleteRerun { remaining: usize },
}

/// Error raised by the debrief service. Store failures never appear here;
/// they are logged and swallowed.
#[derive(Debug, thiserror::Error)]
pub enum DebriefServiceError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Everything the presentation layer needs per render, derived from the
/// selection sets and script on each call.
#[derive(Debug, Clone, Serialize)]
pub struct DebriefView {
    pub phase: DebriefPhase,
    pub line_count: usize,
    pub answered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_line: Option<LineView>,
    pub snapshot: ScoreSnapshot,
    pub flagged: Vec<LineView>,
    pub rerun_available: bool,
    pub rerun_answered: usize,
    pub rerun_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<Vec<SignalDelta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_notes: Option<String>,
}

/// One line as shown to the trainee.
#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    pub line_index: usize,
    pub speaker_role: String,
    pub persona: String,
    pub prompt: String,
    pub coaching_cue: String,
    pub options: Vec<String>,
}
