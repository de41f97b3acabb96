use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::training::debrief::blueprint::DialogueBlueprint;
use crate::training::debrief::catalog::SignalCatalog;
use crate::training::debrief::domain::{
    DialogueLine, DialogueScript, OptionEffect, ResponseOption, SignalKey,
};
use crate::training::debrief::router::debrief_router;
use crate::training::debrief::scoring::{ScoringConfig, ScoringEngine};
use crate::training::debrief::service::{DebriefService, ScoringMode};
use crate::training::debrief::store::{self, PersistedSession, SessionStore, StoreError};

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig::default()
}

pub(super) fn assessment_engine() -> ScoringEngine {
    let (_, catalog) = DialogueBlueprint::assessment();
    ScoringEngine::new(catalog, scoring_config())
}

/// Five-line continuous script. Choosing the warm option on lines 1 and 4
/// contributes "warmth" effects of +0.5 and +1.0 (the 0.75 -> 0.8 case).
pub(super) fn warmth_script() -> (DialogueScript, SignalCatalog) {
    let neutral = |label: &str| ResponseOption {
        label: label.to_string(),
        effect: OptionEffect::Continuous {
            effects: BTreeMap::new(),
        },
    };
    let warm = |label: &str, warmth: f64, candor: f64| {
        let mut effects = BTreeMap::new();
        effects.insert(SignalKey::new("warmth"), warmth);
        if candor != 0.0 {
            effects.insert(SignalKey::new("candor"), candor);
        }
        ResponseOption {
            label: label.to_string(),
            effect: OptionEffect::Continuous { effects },
        }
    };
    let line = |prompt: &str, options: Vec<ResponseOption>| DialogueLine {
        speaker_role: "peer".to_string(),
        persona: "Sam".to_string(),
        prompt: prompt.to_string(),
        coaching_cue: String::new(),
        options,
    };

    let script = DialogueScript {
        title: "Warmth fixture".to_string(),
        lines: vec![
            line("opener", vec![neutral("nod"), neutral("wave")]),
            line("check-in", vec![warm("ask how they are", 0.5, 0.0), neutral("skip it")]),
            line("pushback", vec![neutral("hold position"), warm("soften", -0.5, 0.5)]),
            line("aside", vec![neutral("listen"), neutral("interrupt")]),
            line("closing", vec![warm("thank them", 1.0, 0.5), neutral("leave")]),
        ],
    };

    let catalog = SignalCatalog::new(vec![
        signal_def("warmth", "Warmth"),
        signal_def("candor", "Candor"),
    ]);

    (script, catalog)
}

pub(super) fn signal_def(
    key: &str,
    label: &str,
) -> crate::training::debrief::catalog::SignalDefinition {
    crate::training::debrief::catalog::SignalDefinition {
        key: SignalKey::new(key),
        label: label.to_string(),
        abbreviation: label[..2.min(label.len())].to_uppercase(),
        description: String::new(),
        line_index: None,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    records: Arc<Mutex<HashMap<String, PersistedSession>>>,
}

impl MemoryStore {
    pub(super) fn record(&self, key: &str) -> Option<PersistedSession> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }

    pub(super) fn insert(&self, key: &str, record: PersistedSession) {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), record);
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<PersistedSession>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned())
    }

    fn save(&self, key: &str, session: &PersistedSession) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), session.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .remove(key);
        Ok(())
    }
}

/// Store whose writes always fail; the service must shrug these off.
pub(super) struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn load(&self, _key: &str) -> Result<Option<PersistedSession>, StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn save(&self, _key: &str, _session: &PersistedSession) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }
}

pub(super) fn build_service() -> (DebriefService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let (script, catalog) = DialogueBlueprint::assessment();
    let service = DebriefService::new(
        script,
        catalog,
        ScoringMode::Assessment,
        scoring_config(),
        store.clone(),
    )
    .expect("blueprint script validates");
    (service, store)
}

/// Answer every line with its top-scoring option (index 0 in the blueprint).
pub(super) fn answer_all_best(service: &DebriefService<MemoryStore>) {
    let line_count = service.script().line_count();
    for line_index in 0..line_count {
        service
            .answer(line_index, 0)
            .expect("best option is always valid");
    }
}

/// Scenario fixture: line 3 answered with the 0-score option, line 5 with
/// the 1-score option, everything else best.
pub(super) fn answer_with_two_weak_beats(service: &DebriefService<MemoryStore>) {
    for line_index in 0..service.script().line_count() {
        let option_index = match line_index {
            3 => 2,
            5 => 1,
            _ => 0,
        };
        service
            .answer(line_index, option_index)
            .expect("scripted answer is valid");
    }
}

pub(super) fn session_key() -> &'static str {
    store::SESSION_KEY
}

pub(super) fn debrief_router_with_service(
    service: DebriefService<MemoryStore>,
) -> axum::Router {
    debrief_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
