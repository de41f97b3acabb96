use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use empathy_coach::training::debrief::{
    PersistedSession, ScoringConfig, SessionStore, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Durable session store keeping one JSON file per key under a base
/// directory. A missing or unparsable file reads as "no session", so a
/// corrupt record can never block a fresh start.
pub(crate) struct FileSessionStore {
    base_dir: PathBuf,
}

impl FileSessionStore {
    pub(crate) fn new(base_dir: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{file_name}.json"))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, key: &str) -> Result<Option<PersistedSession>, StoreError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Unavailable(err.to_string())),
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!(%err, path = %path.display(), "discarding unparsable session record");
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, session: &PersistedSession) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(session)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        fs::write(self.path_for(key), json)
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Unavailable(err.to_string())),
        }
    }
}

/// In-memory store backing the demo command and tests.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    records: Arc<Mutex<HashMap<String, PersistedSession>>>,
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, key: &str) -> Result<Option<PersistedSession>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("session store mutex poisoned")
            .get(key)
            .cloned())
    }

    fn save(&self, key: &str, session: &PersistedSession) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("session store mutex poisoned")
            .insert(key.to_string(), session.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("session store mutex poisoned")
            .remove(key);
        Ok(())
    }
}

pub(crate) fn default_scoring_config() -> ScoringConfig {
    ScoringConfig::default()
}
