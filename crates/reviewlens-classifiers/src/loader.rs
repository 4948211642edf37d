//! Extension points for loading inference adapters

use crate::inference::InferenceAdapter;
use crate::lexicon::{LexiconSarcasmAdapter, LexiconSentimentAdapter};
use crate::model_config::{ModelConfig, ModelRegistry, ModelSource};
use async_trait::async_trait;
use reviewlens_core::{Error, Result};
use std::sync::Arc;

/// Pluggable backend that turns a model name into a ready adapter.
///
/// The orchestrator calls this at startup and again when it reloads after
/// an inference failure, so implementations must be callable repeatedly.
#[async_trait]
pub trait AdapterLoader: Send + Sync {
    /// Load an adapter instance by model name.
    async fn load_adapter(&self, name: &str) -> Result<Arc<dyn InferenceAdapter>>;

    /// List model names available to this loader.
    fn available_models(&self) -> Vec<String>;
}

/// Loader backed by a [`ModelRegistry`]
///
/// An optional fallback registry is consulted when an entry of the primary
/// registry fails to load, so a missing download or a build without
/// transformer support still yields a working pair.
pub struct RegistryLoader {
    registry: Arc<ModelRegistry>,
    fallback: Option<Arc<ModelRegistry>>,
}

impl RegistryLoader {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            fallback: None,
        }
    }

    /// Use `fallback` for any model the primary registry cannot load
    pub fn with_fallback(mut self, fallback: ModelRegistry) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }
}

#[async_trait]
impl AdapterLoader for RegistryLoader {
    async fn load_adapter(&self, name: &str) -> Result<Arc<dyn InferenceAdapter>> {
        let err = match load_from(&self.registry, name) {
            Ok(adapter) => return Ok(adapter),
            Err(err) => err,
        };

        match &self.fallback {
            Some(fallback) if fallback.get_model(name).is_some() => {
                tracing::warn!(
                    "Model '{}' failed to load ({}); using fallback registry",
                    name,
                    err
                );
                load_from(fallback, name)
            }
            _ => Err(err),
        }
    }

    fn available_models(&self) -> Vec<String> {
        self.registry.models.keys().cloned().collect()
    }
}

fn load_from(registry: &ModelRegistry, name: &str) -> Result<Arc<dyn InferenceAdapter>> {
    let config = registry
        .get_model(name)
        .ok_or_else(|| Error::config(format!("Model '{name}' not found in registry")))?;

    tracing::info!("Loading model '{}' from registry", name);

    match &config.source {
        ModelSource::Builtin { implementation } => builtin_adapter(implementation, config),
        _ => load_transformer_adapter(config),
    }
}

fn builtin_adapter(implementation: &str, config: &ModelConfig) -> Result<Arc<dyn InferenceAdapter>> {
    let name = if config.name.is_empty() {
        implementation
    } else {
        config.name.as_str()
    };

    match implementation {
        "sentiment-lexicon" => Ok(Arc::new(LexiconSentimentAdapter::with_name(name)?)),
        "sarcasm-lexicon" => Ok(Arc::new(LexiconSarcasmAdapter::with_name(name)?)),
        other => Err(Error::config(format!(
            "Unknown builtin implementation '{other}'"
        ))),
    }
}

#[cfg(feature = "ml-models")]
fn load_transformer_adapter(config: &ModelConfig) -> Result<Arc<dyn InferenceAdapter>> {
    Ok(Arc::new(crate::model_loader::load_transformer(config)?))
}

#[cfg(not(feature = "ml-models"))]
fn load_transformer_adapter(_config: &ModelConfig) -> Result<Arc<dyn InferenceAdapter>> {
    Err(Error::inference(
        "Transformer models require the 'ml-models' feature",
    ))
}
