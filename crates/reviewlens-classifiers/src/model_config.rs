//! Model configuration and registry structures

use reviewlens_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Registry key of the sentiment model
pub const SENTIMENT_MODEL: &str = "sentiment";

/// Registry key of the sarcasm model
pub const SARCASM_MODEL: &str = "sarcasm";

/// HuggingFace checkpoint behind the default sarcasm model
pub const SARCASM_CHECKPOINT: &str = "helinivan/english-sarcasm-detector";

/// Model registry containing all available models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRegistry {
    pub version: String,
    pub models: HashMap<String, ModelConfig>,
}

/// Configuration for a single model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name
    #[serde(default)]
    pub name: String,

    /// Model description
    #[serde(default)]
    pub description: String,

    /// Model source (where to load from)
    pub source: ModelSource,

    /// Model architecture configuration
    pub architecture: ArchitectureConfig,

    /// Inference settings
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Model source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSource {
    /// Load from local filesystem
    Local { path: PathBuf },

    /// Download from HuggingFace Hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
    },

    /// Use built-in implementation
    Builtin { implementation: String },
}

fn default_revision() -> String {
    "main".to_string()
}

/// Model architecture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ArchitectureConfig {
    /// BERT for sequence classification
    BertSequenceClassification {
        num_labels: usize,
        #[serde(default)]
        labels: Vec<String>,
    },

    /// RoBERTa for sequence classification (shares the XLM-RoBERTa graph)
    RobertaSequenceClassification {
        num_labels: usize,
        #[serde(default)]
        labels: Vec<String>,
    },

    /// XLM-RoBERTa for sequence classification
    XlmRobertaSequenceClassification {
        num_labels: usize,
        #[serde(default)]
        labels: Vec<String>,
    },

    /// DeBERTa-v2/v3 for sequence classification
    DebertaSequenceClassification {
        num_labels: usize,
        #[serde(default)]
        labels: Vec<String>,
    },

    /// Builtin lexicon (no weights)
    Lexicon,
}

impl ArchitectureConfig {
    pub fn num_labels(&self) -> Option<usize> {
        match self {
            Self::BertSequenceClassification { num_labels, .. }
            | Self::RobertaSequenceClassification { num_labels, .. }
            | Self::XlmRobertaSequenceClassification { num_labels, .. }
            | Self::DebertaSequenceClassification { num_labels, .. } => Some(*num_labels),
            Self::Lexicon => None,
        }
    }
}

/// Inference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Device to run on (cpu, cuda, mps)
    #[serde(default = "default_device")]
    pub device: String,

    /// Maximum sequence length
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_max_length() -> usize {
    512
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            max_length: default_max_length(),
        }
    }
}

impl ModelRegistry {
    /// Load model registry from YAML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| {
            Error::config(format!("Failed to parse model registry {}: {e}", path.display()))
        })
    }

    /// Get a model configuration by name
    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    /// Twitter-RoBERTa sentiment and a fine-tuned BERT sarcasm head from HuggingFace
    ///
    /// Both checkpoints ship a trained classification head. A bare encoder
    /// (for example `microsoft/deberta-v3-base`) has no `classifier` tensors
    /// and cannot be used here.
    pub fn transformer_defaults() -> Self {
        let sentiment = ModelConfig {
            name: "twitter-roberta-base-sentiment".to_string(),
            description: "Three-way tweet sentiment (negative, neutral, positive)".to_string(),
            source: ModelSource::HuggingFace {
                repo: "cardiffnlp/twitter-roberta-base-sentiment".to_string(),
                revision: default_revision(),
            },
            architecture: ArchitectureConfig::RobertaSequenceClassification {
                num_labels: 3,
                labels: vec![
                    "negative".to_string(),
                    "neutral".to_string(),
                    "positive".to_string(),
                ],
            },
            inference: InferenceConfig::default(),
        };

        let sarcasm = ModelConfig {
            name: "english-sarcasm-detector".to_string(),
            description: "Binary sarcasm classifier fine-tuned from bert-base-uncased".to_string(),
            source: ModelSource::HuggingFace {
                repo: SARCASM_CHECKPOINT.to_string(),
                revision: default_revision(),
            },
            architecture: ArchitectureConfig::BertSequenceClassification {
                num_labels: 2,
                labels: vec!["not_sarcastic".to_string(), "sarcastic".to_string()],
            },
            inference: InferenceConfig::default(),
        };

        Self {
            version: "1.0".to_string(),
            models: HashMap::from([
                (SENTIMENT_MODEL.to_string(), sentiment),
                (SARCASM_MODEL.to_string(), sarcasm),
            ]),
        }
    }

    /// Lexicon adapters only; runs without downloading anything
    pub fn builtin() -> Self {
        let lexicon = |implementation: &str| ModelConfig {
            name: implementation.to_string(),
            description: String::new(),
            source: ModelSource::Builtin {
                implementation: implementation.to_string(),
            },
            architecture: ArchitectureConfig::Lexicon,
            inference: InferenceConfig::default(),
        };

        Self {
            version: "1.0".to_string(),
            models: HashMap::from([
                (SENTIMENT_MODEL.to_string(), lexicon("sentiment-lexicon")),
                (SARCASM_MODEL.to_string(), lexicon("sarcasm-lexicon")),
            ]),
        }
    }
}
