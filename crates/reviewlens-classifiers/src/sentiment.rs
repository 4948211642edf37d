//! Negation-aware sentiment scorer
//!
//! Wraps the three-way sentiment adapter (negative, neutral, positive).
//! Negators are fused with the following word before tokenization, and a
//! winning negative probability is boosted in place. The published
//! distribution is derived from the boosted probabilities, so the reported
//! score always matches the winning slot of `full_distribution`; the
//! distribution may therefore sum to more than 100.

use crate::inference::{Distribution, InferenceAdapter};
use reviewlens_core::calibration::{
    round_to, NEGATION_BOOST, NEGATION_WORDS, NEGATIVE_BOOST, SENTIMENT_LABELS,
};
use reviewlens_core::{BaseLabel, Error, Result, SentimentResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct SentimentScorer {
    adapter: Arc<dyn InferenceAdapter>,
}

impl SentimentScorer {
    pub fn new(adapter: Arc<dyn InferenceAdapter>) -> Self {
        Self { adapter }
    }

    /// Score non-empty text
    pub async fn score(&self, text: &str) -> Result<SentimentResult> {
        if text.trim().is_empty() {
            return Err(Error::validation("text cannot be empty"));
        }

        let processed = preprocess(text);
        let distribution = self.adapter.infer(&processed).await?;
        debug!(
            adapter = self.adapter.name(),
            latency_us = distribution.latency_us,
            "sentiment inference complete"
        );

        score_distribution(&processed, distribution)
    }
}

/// Lower-case and fuse negators with the word that follows them
pub fn preprocess(text: &str) -> String {
    let mut text = text
        .to_lowercase()
        .replace("not ", "not_")
        .replace("n't ", "n't_");

    for word in NEGATION_WORDS {
        text = text.replace(&format!("{word} "), &format!("{word}_"));
    }
    text
}

/// Whether any negation word occurs as a substring of the preprocessed text
pub fn contains_negation(processed: &str) -> bool {
    NEGATION_WORDS.iter().any(|word| processed.contains(word))
}

/// Turn raw model probabilities into a labeled, boosted result
pub fn score_distribution(processed: &str, distribution: Distribution) -> Result<SentimentResult> {
    if distribution.len() != SENTIMENT_LABELS.len() {
        return Err(Error::inference(format!(
            "sentiment model returned {} probabilities, expected {}",
            distribution.len(),
            SENTIMENT_LABELS.len()
        )));
    }

    let (max_idx, _) = distribution
        .argmax()
        .ok_or_else(|| Error::inference("sentiment model returned no usable probabilities"))?;
    let label = BaseLabel::from_index(max_idx)
        .ok_or_else(|| Error::inference(format!("no sentiment label at index {max_idx}")))?;

    let mut probs = distribution.probabilities;
    if label == BaseLabel::Negative {
        let factor = if contains_negation(processed) {
            NEGATION_BOOST
        } else {
            NEGATIVE_BOOST
        };
        probs[max_idx] *= factor;
    }

    let full_distribution: BTreeMap<String, f32> = BaseLabel::ALL
        .iter()
        .map(|label| (label.as_str().to_string(), round_to(probs[label.index()] * 100.0, 2)))
        .collect();

    Ok(SentimentResult {
        label: label.as_str().to_string(),
        score: round_to(probs[max_idx], 4),
        full_distribution,
    })
}
