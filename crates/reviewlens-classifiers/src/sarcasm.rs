//! Sarcasm detector over a binary {not-sarcastic, sarcastic} adapter

use crate::inference::InferenceAdapter;
use reviewlens_core::{Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Index of the sarcastic class in the adapter output
const SARCASTIC_INDEX: usize = 1;

pub struct SarcasmDetector {
    adapter: Arc<dyn InferenceAdapter>,
}

impl SarcasmDetector {
    pub fn new(adapter: Arc<dyn InferenceAdapter>) -> Self {
        Self { adapter }
    }

    /// Probability mass on the sarcastic class, clamped to [0, 1]
    pub async fn detect(&self, text: &str) -> Result<f32> {
        let distribution = self.adapter.infer(text).await?;
        let score = distribution.get(SARCASTIC_INDEX).ok_or_else(|| {
            Error::inference(format!(
                "sarcasm model returned {} probabilities, expected 2",
                distribution.len()
            ))
        })?;

        debug!(
            adapter = self.adapter.name(),
            score,
            latency_us = distribution.latency_us,
            "sarcasm inference complete"
        );

        Ok(clamp_unit(score))
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
