//! Server configuration

use reviewlens_classifiers::model_config::{SARCASM_MODEL, SENTIMENT_MODEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Review storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Path of the flat JSON settings file
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// Model selection
    #[serde(default)]
    pub models: ModelsConfig,

    /// Inference limits
    #[serde(default)]
    pub inference: InferenceLimits,

    /// Origins allowed to call `/api/*` from a browser
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

/// Overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen: Option<String>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub in_memory: bool,
    pub settings_path: Option<PathBuf>,
    pub models_registry: Option<PathBuf>,
    pub builtin_models: bool,
    pub inference_timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: impl AsRef<Path>, overrides: &ConfigOverrides) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();

        // Try to load from file, or use defaults
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(listen) = &overrides.listen {
            self.listen = listen.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(database) = &overrides.database {
            self.storage.backend = StorageBackend::Sqlite;
            self.storage.path = database.clone();
        }
        if overrides.in_memory {
            self.storage.backend = StorageBackend::Memory;
        }
        if let Some(path) = &overrides.settings_path {
            self.settings_path = path.clone();
        }
        if let Some(registry) = &overrides.models_registry {
            self.models.registry = Some(registry.clone());
        }
        if overrides.builtin_models {
            self.models.builtin = true;
        }
        if let Some(secs) = overrides.inference_timeout_secs {
            self.inference.timeout_secs = Some(secs);
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            storage: StorageConfig::default(),
            settings_path: default_settings_path(),
            models: ModelsConfig::default(),
            inference: InferenceLimits::default(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Review storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Insert sample reviews into an empty store at startup
    #[serde(default = "default_true")]
    pub seed: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_database_path(),
            seed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Durable SQLite file
    #[default]
    Sqlite,
    /// Volatile, lost on restart
    Memory,
}

/// Which models back the sentiment and sarcasm adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Model registry YAML; when unset the transformer defaults are used
    #[serde(default)]
    pub registry: Option<PathBuf>,

    /// Use the lexicon adapters instead of transformer weights
    #[serde(default)]
    pub builtin: bool,

    /// Registry key of the sentiment model
    #[serde(default = "default_sentiment_model")]
    pub sentiment: String,

    /// Registry key of the sarcasm model
    #[serde(default = "default_sarcasm_model")]
    pub sarcasm: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            registry: None,
            builtin: false,
            sentiment: default_sentiment_model(),
            sarcasm: default_sarcasm_model(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceLimits {
    /// Upper bound on one scoring pass; unbounded when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl InferenceLimits {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.json")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("reviews.db")
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_sentiment_model() -> String {
    SENTIMENT_MODEL.to_string()
}

fn default_sarcasm_model() -> String {
    SARCASM_MODEL.to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.storage.seed);
        assert!(config.inference.timeout().is_none());
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
port: 8088
storage:
  backend: memory
models:
  builtin: true
inference:
  timeout_secs: 30
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.listen, "0.0.0.0");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.models.builtin);
        assert_eq!(config.models.sentiment, "sentiment");
        assert_eq!(config.inference.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_overrides() {
        let mut config = ServerConfig::default();
        config.apply(&ConfigOverrides {
            port: Some(9000),
            database: Some(PathBuf::from("/tmp/r.db")),
            builtin_models: true,
            ..Default::default()
        });
        assert_eq!(config.port, 9000);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/r.db"));
        assert!(config.models.builtin);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            ServerConfig::load("/nonexistent/reviewlens.yaml", &ConfigOverrides::default()).unwrap();
        assert_eq!(config.port, 5000);
    }
}
