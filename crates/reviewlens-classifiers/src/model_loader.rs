//! Candle-backed transformer adapters
//!
//! Loads sequence-classification checkpoints (BERT, RoBERTa, XLM-RoBERTa,
//! DeBERTa-v2/v3) from a local directory or the HuggingFace Hub and exposes
//! them as [`InferenceAdapter`]s returning softmax probabilities.

use crate::inference::{Distribution, InferenceAdapter};
use crate::model_config::{ArchitectureConfig, ModelConfig, ModelSource};
use async_trait::async_trait;
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::debertav2::{
    Config as DebertaV2Config, DebertaV2SeqClassificationModel, Id2Label as DebertaId2Label,
};
use candle_transformers::models::xlm_roberta::{
    Config as XlmRobertaConfig, XLMRobertaForSequenceClassification,
};
use reviewlens_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationDirection};

/// Load a transformer adapter described by `config`
pub fn load_transformer(config: &ModelConfig) -> Result<TransformerAdapter> {
    let model_path = resolve_model_path(config)?;
    let device = get_device(&config.inference.device)?;
    let tokenizer = load_tokenizer(&model_path)?;
    let name = resolved_name(config);

    let (model, labels) = match &config.architecture {
        ArchitectureConfig::BertSequenceClassification { num_labels, labels } => {
            let bert_config: BertConfig = parse_json_config(&model_path.join("config.json"))?;
            let vb = load_var_builder(&model_path, &device)?;
            let (backbone, pooler) = load_bert_backbone(&vb, &bert_config)?;
            let head = candle_nn::linear(bert_config.hidden_size, *num_labels, vb.pp("classifier"))
                .map_err(|e| Error::inference(format!("Failed to load classification head: {e}")))?;
            (
                SequenceModel::Bert {
                    backbone,
                    pooler,
                    head,
                },
                normalized_labels(*num_labels, labels),
            )
        }
        ArchitectureConfig::RobertaSequenceClassification { num_labels, labels }
        | ArchitectureConfig::XlmRobertaSequenceClassification { num_labels, labels } => {
            let xlm_config: XlmRobertaConfig = parse_json_config(&model_path.join("config.json"))?;
            let vb = load_var_builder(&model_path, &device)?;
            let model = XLMRobertaForSequenceClassification::new(*num_labels, &xlm_config, vb)
                .map_err(|e| Error::inference(format!("Failed to load RoBERTa model: {e}")))?;
            (
                SequenceModel::Roberta(model),
                normalized_labels(*num_labels, labels),
            )
        }
        ArchitectureConfig::DebertaSequenceClassification { num_labels, labels } => {
            let deberta_config: DebertaV2Config =
                parse_json_config(&model_path.join("config.json"))?;
            let vb = load_var_builder(&model_path, &device)?;
            let labels = normalized_labels(*num_labels, labels);
            let id2label: DebertaId2Label = labels
                .iter()
                .enumerate()
                .map(|(idx, label)| (idx as u32, label.clone()))
                .collect();
            let model = load_deberta_sequence_model(&vb, &deberta_config, id2label)?;
            (SequenceModel::Deberta(model), labels)
        }
        ArchitectureConfig::Lexicon => {
            return Err(Error::config(format!(
                "Model '{name}' is a lexicon and has no transformer weights"
            )))
        }
    };

    tracing::info!(
        model = %name,
        labels = ?labels,
        "Loaded transformer classifier"
    );

    Ok(TransformerAdapter {
        name,
        tokenizer,
        model,
        device,
        labels,
        max_length: config.inference.max_length,
    })
}

fn resolve_model_path(config: &ModelConfig) -> Result<PathBuf> {
    match &config.source {
        ModelSource::Local { path } => {
            if !path.exists() {
                return Err(Error::inference(format!(
                    "Model path does not exist: {}",
                    path.display()
                )));
            }
            Ok(path.clone())
        }
        ModelSource::HuggingFace { repo, revision } => download_from_huggingface(repo, revision),
        ModelSource::Builtin { implementation } => Err(Error::config(format!(
            "Builtin implementation '{implementation}' should not use the transformer loader"
        ))),
    }
}

fn download_from_huggingface(repo: &str, revision: &str) -> Result<PathBuf> {
    tracing::info!("Downloading model from HuggingFace: {} @ {}", repo, revision);

    let cache_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache/reviewlens/models");
    std::fs::create_dir_all(&cache_dir).ok();

    let api = hf_hub::api::sync::ApiBuilder::new()
        .with_cache_dir(cache_dir)
        .build()
        .map_err(|e| Error::inference(format!("Failed to initialize HuggingFace API: {e}")))?;

    let repo_obj = api.repo(hf_hub::Repo::with_revision(
        repo.to_string(),
        hf_hub::RepoType::Model,
        revision.to_string(),
    ));

    let found_weights = ["model.safetensors", "pytorch_model.bin"]
        .iter()
        .any(|file| repo_obj.get(file).is_ok());
    if !found_weights {
        return Err(Error::inference(
            "No model weights found (tried model.safetensors, pytorch_model.bin)",
        ));
    }

    for file in ["tokenizer.json", "vocab.json", "merges.txt", "vocab.txt"] {
        if repo_obj.get(file).is_err() {
            tracing::debug!("File not found: {}", file);
        }
    }

    let config_path = repo_obj
        .get("config.json")
        .map_err(|e| Error::inference(format!("Failed to download config.json: {e}")))?;

    let model_dir = config_path
        .parent()
        .ok_or_else(|| Error::inference("Invalid cache path"))?;

    tracing::info!("Model available at: {}", model_dir.display());
    Ok(model_dir.to_path_buf())
}

fn get_device(device_str: &str) -> Result<Device> {
    match device_str.to_lowercase().as_str() {
        "cuda" | "cuda:0" => Device::new_cuda(0)
            .map_err(|e| Error::inference(format!("Failed to initialize CUDA: {e}"))),
        "mps" | "metal" => Device::new_metal(0)
            .map_err(|e| Error::inference(format!("Failed to initialize Metal: {e}"))),
        _ => Ok(Device::Cpu),
    }
}

fn resolved_name(config: &ModelConfig) -> String {
    if config.name.is_empty() {
        "transformer-model".to_string()
    } else {
        config.name.clone()
    }
}

fn parse_json_config<T: DeserializeOwned>(config_path: &Path) -> Result<T> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        Error::inference(format!(
            "Failed to read config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&config_str).map_err(|e| {
        Error::inference(format!(
            "Failed to parse config {}: {}",
            config_path.display(),
            e
        ))
    })
}

fn load_var_builder(model_path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_path.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is not modified for the lifetime of the mapping
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)
                .map_err(|e| Error::inference(format!("Failed to load weights: {e}")))?
        };
        return Ok(vb);
    }

    let pth = model_path.join("pytorch_model.bin");
    if pth.exists() {
        return VarBuilder::from_pth(&pth, DType::F32, device)
            .map_err(|e| Error::inference(format!("Failed to load weights: {e}")));
    }

    Err(Error::inference(format!(
        "No model weights found in {}",
        model_path.display()
    )))
}

/// Encoder plus the pooler dense layer that feeds the classification head
fn load_bert_backbone(vb: &VarBuilder, config: &BertConfig) -> Result<(BertModel, Linear)> {
    let mut errors = Vec::new();

    for prefix in ["bert", ""] {
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(prefix)
        };

        let loaded = BertModel::load(vb_prefix.clone(), config).and_then(|backbone| {
            let pooler = candle_nn::linear(
                config.hidden_size,
                config.hidden_size,
                vb_prefix.pp("pooler").pp("dense"),
            )?;
            Ok((backbone, pooler))
        });

        match loaded {
            Ok(model) => return Ok(model),
            Err(e) => errors.push(format!(
                "{}: {}",
                if prefix.is_empty() { "<root>" } else { prefix },
                e
            )),
        }
    }

    Err(Error::inference(format!(
        "Failed to load BERT backbone with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

fn load_deberta_sequence_model(
    vb: &VarBuilder,
    config: &DebertaV2Config,
    id2label: DebertaId2Label,
) -> Result<DebertaV2SeqClassificationModel> {
    let mut errors = Vec::new();

    for prefix in ["deberta", ""] {
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(prefix)
        };

        match DebertaV2SeqClassificationModel::load(vb_prefix, config, Some(id2label.clone())) {
            Ok(model) => return Ok(model),
            Err(e) => errors.push(format!(
                "{}: {}",
                if prefix.is_empty() { "<root>" } else { prefix },
                e
            )),
        }
    }

    Err(Error::inference(format!(
        "Failed to load DeBERTa sequence model with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

/// `tokenizer.json` if present, else a byte-level BPE (RoBERTa) or
/// WordPiece (BERT) tokenizer rebuilt from the vocabulary files
fn load_tokenizer(model_path: &Path) -> Result<Tokenizer> {
    let tokenizer_json_path = model_path.join("tokenizer.json");
    if tokenizer_json_path.exists() {
        tracing::debug!("Loading tokenizer from tokenizer.json");
        return Tokenizer::from_file(&tokenizer_json_path)
            .map_err(|e| Error::inference(format!("Failed to load tokenizer.json: {e}")));
    }

    let vocab_json_path = model_path.join("vocab.json");
    let merges_path = model_path.join("merges.txt");
    if vocab_json_path.exists() && merges_path.exists() {
        tracing::debug!("Building byte-level BPE tokenizer from vocab.json and merges.txt");

        use tokenizers::models::bpe::BPE;
        use tokenizers::pre_tokenizers::byte_level::ByteLevel;
        use tokenizers::processors::roberta::RobertaProcessing;

        let bpe = BPE::from_file(
            vocab_json_path.to_string_lossy().as_ref(),
            merges_path.to_string_lossy().as_ref(),
        )
        .build()
        .map_err(|e| Error::inference(format!("Failed to build BPE model: {e}")))?;

        let mut tokenizer = Tokenizer::new(bpe);
        tokenizer.with_pre_tokenizer(Some(ByteLevel::new(false, true, true)));
        tokenizer.with_decoder(Some(ByteLevel::default()));
        tokenizer.with_post_processor(Some(RobertaProcessing::default()));
        return Ok(tokenizer);
    }

    let vocab_path = model_path.join("vocab.txt");
    if vocab_path.exists() {
        tracing::debug!("Building WordPiece tokenizer from vocab.txt");

        use tokenizers::models::wordpiece::WordPiece;
        use tokenizers::normalizers::BertNormalizer;
        use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
        use tokenizers::processors::bert::BertProcessing;

        let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| Error::inference(format!("Failed to build WordPiece model: {e}")))?;

        let mut tokenizer = Tokenizer::new(wordpiece);
        tokenizer.with_normalizer(Some(BertNormalizer::default()));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
        tokenizer.with_post_processor(Some(BertProcessing::new(
            ("[SEP]".to_string(), 102),
            ("[CLS]".to_string(), 101),
        )));
        return Ok(tokenizer);
    }

    Err(Error::inference(format!(
        "No tokenizer found in {} (tried tokenizer.json, vocab.json + merges.txt, vocab.txt)",
        model_path.display()
    )))
}

fn normalized_labels(num_labels: usize, labels: &[String]) -> Vec<String> {
    let mut resolved = labels.to_vec();
    resolved.truncate(num_labels);
    for idx in resolved.len()..num_labels {
        resolved.push(format!("label_{idx}"));
    }
    resolved
}

enum SequenceModel {
    Bert {
        backbone: BertModel,
        pooler: Linear,
        head: Linear,
    },
    Roberta(XLMRobertaForSequenceClassification),
    Deberta(DebertaV2SeqClassificationModel),
}

/// A loaded transformer with its tokenizer
pub struct TransformerAdapter {
    name: String,
    tokenizer: Tokenizer,
    model: SequenceModel,
    device: Device,
    labels: Vec<String>,
    max_length: usize,
}

impl TransformerAdapter {
    fn row(&self, values: &[u32], what: &str) -> Result<Tensor> {
        Tensor::new(values, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| Error::inference(format!("Failed to create {what} tensor: {e}")))
    }

    fn logits(&self, text: &str) -> Result<Tensor> {
        let mut encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::inference(format!("Tokenization failed: {e}")))?;
        encoding.truncate(self.max_length, 0, TruncationDirection::Right);

        let input_ids = self.row(encoding.get_ids(), "input ids")?;
        let token_type_ids = self.row(encoding.get_type_ids(), "token type")?;
        let attention_mask = self.row(encoding.get_attention_mask(), "attention mask")?;

        let forward = match &self.model {
            SequenceModel::Bert {
                backbone,
                pooler,
                head,
            } => backbone
                .forward(&input_ids, &token_type_ids, Some(&attention_mask))
                .and_then(|hidden| hidden.i((.., 0, ..)))
                .and_then(|cls| pooler.forward(&cls))
                .and_then(|pooled| pooled.tanh())
                .and_then(|pooled| head.forward(&pooled)),
            SequenceModel::Roberta(model) => {
                model.forward(&input_ids, &attention_mask, &token_type_ids)
            }
            SequenceModel::Deberta(model) => {
                model.forward(&input_ids, Some(token_type_ids), Some(attention_mask))
            }
        };

        forward.map_err(|e| Error::inference(format!("Model forward pass failed: {e}")))
    }
}

#[async_trait]
impl InferenceAdapter for TransformerAdapter {
    async fn infer(&self, text: &str) -> Result<Distribution> {
        let start = Instant::now();
        let logits = self.logits(text)?;

        let probabilities = candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|p| p.squeeze(0))
            .and_then(|p| p.to_dtype(DType::F32))
            .and_then(|p| p.to_vec1::<f32>())
            .map_err(|e| Error::inference(format!("Softmax failed: {e}")))?;

        Ok(Distribution {
            probabilities,
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}
