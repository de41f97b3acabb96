//! Behavioural scoring and debrief flow for scripted practice dialogues.
//!
//! A trainee answers one option per line of an immutable script, the engine
//! derives per-signal scores, the weakest beats get flagged for an optional
//! re-run, and the two passes are compared signal by signal. The session
//! state machine persists itself best-effort so a reload resumes mid-flow.

pub mod blueprint;
pub mod catalog;
pub mod domain;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use blueprint::DialogueBlueprint;
pub use catalog::{SignalCatalog, SignalDefinition};
pub use domain::{
    DebriefPhase, DialogueLine, DialogueScript, OptionEffect, ResponseOption, ScriptError,
    SelectionError, SelectionSet, SignalKey,
};
pub use router::debrief_router;
pub use scoring::{ScoreSnapshot, ScoringConfig, ScoringEngine, SignalDelta, SignalScore};
pub use service::{
    DebriefService, DebriefServiceError, DebriefView, LineView, ScoringMode, TransitionError,
};
pub use store::{PersistedSession, SessionStore, StoreError, SESSION_KEY};
