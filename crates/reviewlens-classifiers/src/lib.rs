//! ReviewLens Classifiers
//!
//! The scoring half of ReviewLens: turns review text into a reconciled
//! sentiment and a sarcasm likelihood.
//!
//! Components, leaves first:
//! - [`InferenceAdapter`]: text in, probability distribution out
//! - [`SentimentScorer`]: negation-aware preprocessing and confidence boosting
//! - [`SarcasmDetector`]: probability mass on the sarcastic class
//! - [`SentimentSarcasmReconciler`]: sarcasm-conditioned label rewriting
//! - [`ScoringPipeline`]: the three composed for one request
//!
//! Adapters are either Candle transformer models (`ml-models` feature) or
//! the builtin lexicons, selected through a YAML [`ModelRegistry`].

pub mod inference;
pub mod lexicon;
pub mod loader;
pub mod model_config;
#[cfg(feature = "ml-models")]
pub mod model_loader;
pub mod pipeline;
pub mod reconcile;
pub mod sarcasm;
pub mod sentiment;

pub use inference::{Distribution, InferenceAdapter};
pub use lexicon::{LexiconSarcasmAdapter, LexiconSentimentAdapter};
pub use loader::{AdapterLoader, RegistryLoader};
pub use model_config::{ArchitectureConfig, InferenceConfig, ModelConfig, ModelRegistry, ModelSource};
pub use pipeline::{PipelineOutput, ScoringPipeline};
pub use reconcile::SentimentSarcasmReconciler;
pub use sarcasm::SarcasmDetector;
pub use sentiment::SentimentScorer;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::inference::{Distribution, InferenceAdapter};
    pub use crate::loader::{AdapterLoader, RegistryLoader};
    pub use crate::pipeline::{PipelineOutput, ScoringPipeline};
    pub use crate::reconcile::SentimentSarcasmReconciler;
    pub use crate::sarcasm::SarcasmDetector;
    pub use crate::sentiment::SentimentScorer;
}
