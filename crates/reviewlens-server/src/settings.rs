//! Flat JSON settings file
//!
//! Keys are opaque to the server; `update` merges top-level keys into the
//! current contents and rewrites the whole file.

use parking_lot::Mutex;
use reviewlens_core::{Error, Result};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

pub type Settings = Map<String, Value>;

pub fn default_settings() -> Settings {
    let defaults = json!({
        "sentiment_api_key": "8e72jd7-demo-key",
        "sarcasm_api_key": "",
        "language_api_key": "lang-demo-3892",
        "negative_threshold": 20,
        "sarcasm_confidence": 75
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub struct SettingsStore {
    path: PathBuf,
    // Serializes read-merge-write cycles
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings, or the defaults if the file is missing or unreadable
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return default_settings();
        }

        match read_settings(&self.path) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Error loading settings from {}: {}", self.path.display(), e);
                default_settings()
            }
        }
    }

    /// Shallow-merge `patch` into the current settings and persist the result
    pub fn update(&self, patch: Value) -> Result<Settings> {
        let Value::Object(patch) = patch else {
            return Err(Error::validation("settings update must be a JSON object"));
        };

        let _guard = self.write_lock.lock();
        let mut settings = self.load();
        settings.extend(patch);

        let contents = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&self.path, contents).map_err(|e| {
            error!("Error saving settings to {}: {}", self.path.display(), e);
            Error::Io(e)
        })?;

        Ok(settings)
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str(&contents)? {
        Value::Object(map) => Ok(map),
        other => {
            warn!("Settings file holds {} instead of an object", kind_of(&other));
            Err(Error::config("settings file is not a JSON object"))
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
