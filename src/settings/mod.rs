//! Settings provider used by the scheduler.
//!
//! Settings are a flat JSON object (key -> value) shared with the rest of the
//! ISP application. Every read goes to the backing store, so a value saved
//! by the settings page is visible to the next read without a restart.

mod file;
mod memory;

pub use file::JsonFileSettings;
pub use memory::MemorySettings;

use crate::error::AppError;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::warn;

/// Errors raised by settings stores
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize settings for {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings root must be a JSON object")]
    NotAnObject,
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::NotAnObject => AppError::Validation(err.to_string()),
            _ => AppError::Settings(err.to_string()),
        }
    }
}

/// Read side of the settings store.
///
/// Implementations must be side-effect free and must not cache.
pub trait SettingsProvider: Send + Sync {
    /// Latest persisted value for `key`
    fn get_raw(&self, key: &str) -> Option<Value>;

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_raw(key)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(default)
    }

    /// Millisecond duration. Zero, negative and unparsable values fall back
    /// to `default`.
    fn get_millis(&self, key: &str, default: Duration) -> Duration {
        match self.get_raw(key) {
            None | Some(Value::Null) => default,
            Some(value) => match parse_millis(&value) {
                Some(ms) => Duration::from_millis(ms),
                None => {
                    warn!(key = key, value = %value, "Invalid duration setting, using default");
                    default
                }
            },
        }
    }
}

/// Read/write settings store
pub trait SettingsStore: SettingsProvider {
    /// Merge `patch` into the stored object and persist it.
    /// A `null` value removes the key.
    fn merge(&self, patch: Map<String, Value>) -> Result<(), SettingsError>;
}

/// Apply a merge patch in place
pub(crate) fn apply_patch(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if value.is_null() {
            target.remove(&key);
        } else {
            target.insert(key, value);
        }
    }
}

pub(crate) fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn parse_millis(value: &Value) -> Option<u64> {
    let ms = match value {
        Value::Number(n) => match n.as_u64() {
            Some(ms) => ms,
            None => {
                let f = n.as_f64()?;
                if !f.is_finite() || f < 1.0 {
                    return None;
                }
                f as u64
            }
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<u64>() {
                Ok(ms) => ms,
                Err(_) => {
                    let f = s.parse::<f64>().ok()?;
                    if !f.is_finite() || f < 1.0 {
                        return None;
                    }
                    f as u64
                }
            }
        }
        _ => return None,
    };
    (ms > 0).then_some(ms)
}
