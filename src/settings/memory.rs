use super::{SettingsError, SettingsProvider, SettingsStore};
use dashmap::DashMap;
use serde_json::{Map, Value};

/// In-process settings, for embedding and tests
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: DashMap<String, Value>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.remove(key).map(|(_, v)| v)
    }
}

impl SettingsProvider for MemorySettings {
    fn get_raw(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|v| v.value().clone())
    }
}

impl SettingsStore for MemorySettings {
    fn merge(&self, patch: Map<String, Value>) -> Result<(), SettingsError> {
        for (key, value) in patch {
            if value.is_null() {
                self.values.remove(&key);
            } else {
                self.values.insert(key, value);
            }
        }
        Ok(())
    }
}
