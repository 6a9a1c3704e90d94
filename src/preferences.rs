//! Preferences and the persistence gateway
//!
//! Preferences are a process-wide singleton loaded once at construction and
//! persisted on every mutation. Persistence goes through the `PreferenceStore`
//! collaborator, a generic key-value seam: the shipped implementations are a
//! JSON-file store under `~/.atelier/` and an in-memory store for tests.
//! Load failures fall back to defaults and log; save failures log only, and
//! the in-memory state stays authoritative for the session.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::personas::Persona;

/// Key under which serialized preferences are stored.
pub const PREFERENCES_KEY: &str = "agent_preferences";

/// Watchdog delay before a `user_idle` event is synthesized.
pub const DEFAULT_AUTO_SUGGEST_DELAY_MS: u64 = 30_000;

/// User-tunable orchestrator preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPreferences {
    pub enabled_personas: HashSet<Persona>,
    pub muted_trigger_types: HashSet<String>,
    pub auto_suggest_delay_ms: u64,
}

impl Default for AgentPreferences {
    fn default() -> Self {
        Self {
            enabled_personas: Persona::ALL.into_iter().collect(),
            muted_trigger_types: HashSet::new(),
            auto_suggest_delay_ms: DEFAULT_AUTO_SUGGEST_DELAY_MS,
        }
    }
}

/// Partial preference overlay; unset fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_personas: Option<HashSet<Persona>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted_trigger_types: Option<HashSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_suggest_delay_ms: Option<u64>,
}

impl PreferencesPatch {
    pub fn apply_to(self, preferences: &mut AgentPreferences) {
        if let Some(enabled) = self.enabled_personas {
            preferences.enabled_personas = enabled;
        }
        if let Some(muted) = self.muted_trigger_types {
            preferences.muted_trigger_types = muted;
        }
        if let Some(delay) = self.auto_suggest_delay_ms {
            preferences.auto_suggest_delay_ms = delay;
        }
    }
}

/// Generic key-value persistence collaborator.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// File-backed store: one file per key under the given directory.
pub struct FilePreferenceStore {
    dir: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store rooted at `~/.atelier/`.
    pub fn default_location() -> Result<Self, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
        Ok(Self::new(home.join(".atelier")))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-memory store for tests and hosts that persist elsewhere.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Load/save bridge between the orchestrator and the key-value store.
pub struct PreferencesGateway {
    store: Arc<dyn PreferenceStore>,
}

impl PreferencesGateway {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Load preferences, falling back to defaults on missing or corrupt data.
    pub fn load(&self) -> AgentPreferences {
        match self.store.get(PREFERENCES_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(preferences) => preferences,
                Err(e) => {
                    log::warn!("preferences: stored value unreadable, using defaults: {}", e);
                    AgentPreferences::default()
                }
            },
            None => AgentPreferences::default(),
        }
    }

    /// Persist preferences. Failures are logged; the in-memory copy stays
    /// authoritative for the session.
    pub fn save(&self, preferences: &AgentPreferences) {
        let json = match serde_json::to_string(preferences) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("preferences: failed to serialize: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(PREFERENCES_KEY, &json) {
            log::warn!("preferences: save failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_every_persona() {
        let preferences = AgentPreferences::default();
        assert_eq!(preferences.enabled_personas.len(), Persona::ALL.len());
        assert!(preferences.muted_trigger_types.is_empty());
        assert_eq!(preferences.auto_suggest_delay_ms, DEFAULT_AUTO_SUGGEST_DELAY_MS);
    }

    #[test]
    fn test_patch_overlays_only_set_fields() {
        let mut preferences = AgentPreferences::default();
        let patch = PreferencesPatch {
            auto_suggest_delay_ms: Some(5_000),
            ..Default::default()
        };
        patch.apply_to(&mut preferences);
        assert_eq!(preferences.auto_suggest_delay_ms, 5_000);
        assert_eq!(preferences.enabled_personas.len(), Persona::ALL.len());
    }

    #[test]
    fn test_file_store_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FilePreferenceStore::new(dir.path().join("nested"));
        assert_eq!(store.get(PREFERENCES_KEY), None);

        store.set(PREFERENCES_KEY, "{\"x\":1}").expect("set");
        assert_eq!(store.get(PREFERENCES_KEY).as_deref(), Some("{\"x\":1}"));
    }

    #[test]
    fn test_gateway_defaults_on_corrupt_data() {
        let store = MemoryPreferenceStore::new();
        store.set(PREFERENCES_KEY, "not json").expect("set");

        let gateway = PreferencesGateway::new(Arc::new(store));
        assert_eq!(gateway.load(), AgentPreferences::default());
    }

    #[test]
    fn test_gateway_save_failure_is_non_fatal() {
        struct FailingStore;
        impl PreferenceStore for FailingStore {
            fn get(&self, _key: &str) -> Option<String> {
                None
            }
            fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
                Err(StoreError::NoHomeDir)
            }
        }

        let gateway = PreferencesGateway::new(Arc::new(FailingStore));
        // Must not panic; the session keeps its in-memory copy.
        gateway.save(&AgentPreferences::default());
    }

    #[test]
    fn test_gateway_round_trips_through_store() {
        let mut preferences = AgentPreferences::default();
        preferences.muted_trigger_types.insert("long_pause".to_string());

        let gateway = PreferencesGateway::new(Arc::new(MemoryPreferenceStore::new()));
        gateway.save(&preferences);
        assert_eq!(gateway.load(), preferences);
    }
}
