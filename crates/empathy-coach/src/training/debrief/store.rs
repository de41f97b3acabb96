use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::DebriefPhase;

/// Fixed key the orchestrator persists its one session record under.
pub const SESSION_KEY: &str = "empathy-coach/session";

/// The durable resume record: phase plus both selection sets. Overwritten
/// on every answer and transition, deleted on restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub phase: DebriefPhase,
    pub run_selections: Vec<Option<usize>>,
    pub rerun_selections: BTreeMap<usize, usize>,
    #[serde(default)]
    pub reflection_notes: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Durable key-value store for session records. Absence of the key means
/// "start fresh"; implementations must report unparsable content as absent
/// rather than failing the load.
pub trait SessionStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<PersistedSession>, StoreError>;
    fn save(&self, key: &str, session: &PersistedSession) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Persistence failures. These are never surfaced to the trainee: the
/// orchestrator logs and swallows them because in-memory state stays
/// authoritative for the running session.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to serialize session record: {0}")]
    Serialization(String),
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
