use super::{apply_patch, SettingsError, SettingsProvider, SettingsStore};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Settings backed by a JSON object file.
///
/// The file is re-read on every lookup. A missing file reads as an empty
/// object; a corrupt one is logged and also reads as empty.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole object, reporting IO and parse errors
    pub fn load(&self) -> Result<Map<String, Value>, SettingsError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SettingsError::NotAnObject),
            Err(source) => Err(SettingsError::Parse {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }

    fn load_lenient(&self) -> Map<String, Value> {
        self.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read settings, treating as empty");
            Map::new()
        })
    }

    fn persist(&self, map: &Map<String, Value>) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_vec_pretty(map).map_err(|source| SettingsError::Serialize {
            path: self.path.display().to_string(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), keys = map.len(), "Settings persisted");
        Ok(())
    }
}

impl SettingsProvider for JsonFileSettings {
    fn get_raw(&self, key: &str) -> Option<Value> {
        self.load_lenient().remove(key)
    }
}

impl SettingsStore for JsonFileSettings {
    fn merge(&self, patch: Map<String, Value>) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock();
        // A corrupt file must not be silently replaced by the patch alone.
        let mut current = self.load()?;
        apply_patch(&mut current, patch);
        self.persist(&current)
    }
}
