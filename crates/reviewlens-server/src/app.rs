//! Application state and wiring

use crate::config::{ServerConfig, StorageBackend};
use crate::orchestrator::{AnalysisOrchestrator, ModelSlot};
use crate::settings::SettingsStore;
use metrics_exporter_prometheus::PrometheusHandle;
use reviewlens_classifiers::{AdapterLoader, ModelRegistry, RegistryLoader};
use reviewlens_store::{seed_if_empty, MemoryReviewStore, ReviewStore, SqliteReviewStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Scoring and write-through
    pub orchestrator: Arc<AnalysisOrchestrator>,

    /// Review persistence
    pub store: Arc<dyn ReviewStore>,

    /// Settings file
    pub settings: Arc<SettingsStore>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Build the state from configuration: open and seed the store, then
    /// try an eager model load (failure is retried on the first request)
    pub async fn new(config: ServerConfig, metrics_handle: PrometheusHandle) -> anyhow::Result<Self> {
        let store = open_store(&config)?;
        if config.storage.seed {
            seed_if_empty(store.as_ref())?;
        }

        let loader = model_loader(&config)?;
        info!("Available models: {:?}", loader.available_models());

        let state = Self::with_components(config, store, loader, metrics_handle);
        if let Err(e) = state.orchestrator.models().load().await {
            warn!("Models not loaded at startup: {}", e);
        }
        Ok(state)
    }

    /// Assemble the state from already-built parts
    pub fn with_components(
        config: ServerConfig,
        store: Arc<dyn ReviewStore>,
        loader: Arc<dyn AdapterLoader>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        let slot = ModelSlot::new(
            loader,
            config.models.sentiment.clone(),
            config.models.sarcasm.clone(),
        );
        let orchestrator =
            AnalysisOrchestrator::new(slot, store.clone()).with_timeout(config.inference.timeout());
        let settings = SettingsStore::new(config.settings_path.clone());

        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            store,
            settings: Arc::new(settings),
            metrics_handle,
        }
    }
}

fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn ReviewStore>> {
    let store: Arc<dyn ReviewStore> = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(SqliteReviewStore::open(&config.storage.path)?),
        StorageBackend::Memory => {
            warn!("Using in-memory review store; reviews are lost on restart");
            Arc::new(MemoryReviewStore::new())
        }
    };
    Ok(store)
}

/// An explicit registry file or `--builtin-models` is used as given. The
/// default transformer registry falls back to the builtin lexicons for any
/// model that cannot be downloaded or loaded.
fn model_loader(config: &ServerConfig) -> anyhow::Result<Arc<dyn AdapterLoader>> {
    let loader = if let Some(path) = &config.models.registry {
        info!("Loading model registry from {}", path.display());
        RegistryLoader::new(ModelRegistry::from_file(path)?)
    } else if config.models.builtin {
        info!("Using builtin lexicon models");
        RegistryLoader::new(ModelRegistry::builtin())
    } else {
        info!("Using default transformer models with builtin fallback");
        RegistryLoader::new(ModelRegistry::transformer_defaults())
            .with_fallback(ModelRegistry::builtin())
    };
    Ok(Arc::new(loader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelsConfig;

    fn with_models(models: ModelsConfig) -> ServerConfig {
        ServerConfig {
            models,
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_builtin_flag_uses_lexicons() {
        let loader = model_loader(&with_models(ModelsConfig {
            builtin: true,
            ..ModelsConfig::default()
        }))
        .unwrap();
        let sarcasm = loader.load_adapter("sarcasm").await.unwrap();
        assert_eq!(sarcasm.name(), "sarcasm-lexicon");
    }

    #[tokio::test]
    async fn test_explicit_registry_has_no_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.yaml");
        std::fs::write(
            &path,
            r#"
version: "1.0"
models:
  sarcasm:
    source:
      type: local
      path: "./no/such/sarcasm/model"
    architecture:
      type: bert-sequence-classification
      num_labels: 2
"#,
        )
        .unwrap();

        let loader = model_loader(&with_models(ModelsConfig {
            registry: Some(path),
            ..ModelsConfig::default()
        }))
        .unwrap();
        assert!(loader.load_adapter("sarcasm").await.is_err());
    }

    #[test]
    fn test_missing_registry_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = with_models(ModelsConfig {
            registry: Some(dir.path().join("missing.yaml")),
            ..ModelsConfig::default()
        });
        assert!(model_loader(&config).is_err());
    }
}
