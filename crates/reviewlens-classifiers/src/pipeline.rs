//! Per-request scoring pipeline
//!
//! Runs the sentiment scorer and the sarcasm detector one after the other
//! (no pipelining) and reconciles the two.

use crate::inference::InferenceAdapter;
use crate::loader::AdapterLoader;
use crate::reconcile::SentimentSarcasmReconciler;
use crate::sarcasm::SarcasmDetector;
use crate::sentiment::SentimentScorer;
use reviewlens_core::calibration::{round_to, SARCASM_REPORT_THRESHOLD, SENTIMENT_LABELS};
use reviewlens_core::{Error, Result, SarcasmResult, SentimentResult};
use std::sync::Arc;
use std::time::Instant;

const WARMUP_SENTIMENT_TEXT: &str = "Hello world";
const WARMUP_SARCASM_TEXT: &str = "This is so great I could cry.";

/// Output of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Scorer output before sarcasm reconciliation
    pub raw: SentimentResult,

    /// Reconciled sentiment
    pub sentiment: SentimentResult,

    /// Unrounded sarcasm probability
    pub sarcasm_score: f32,

    /// Total latency in microseconds
    pub latency_us: u64,
}

impl PipelineOutput {
    pub fn sarcasm(&self) -> SarcasmResult {
        SarcasmResult {
            score: round_to(self.sarcasm_score, 4),
            is_sarcastic: self.sarcasm_score > SARCASM_REPORT_THRESHOLD,
        }
    }
}

pub struct ScoringPipeline {
    scorer: SentimentScorer,
    detector: SarcasmDetector,
    reconciler: SentimentSarcasmReconciler,
}

impl ScoringPipeline {
    pub fn new(
        sentiment: Arc<dyn InferenceAdapter>,
        sarcasm: Arc<dyn InferenceAdapter>,
    ) -> Self {
        Self {
            scorer: SentimentScorer::new(sentiment),
            detector: SarcasmDetector::new(sarcasm),
            reconciler: SentimentSarcasmReconciler::new(),
        }
    }

    /// Load both adapters and check their label layouts
    ///
    /// The scorer reads probabilities positionally, so the sentiment model
    /// must report `negative, neutral, positive` in that order and the
    /// sarcasm model exactly two classes.
    pub async fn load_named(
        loader: &dyn AdapterLoader,
        sentiment: &str,
        sarcasm: &str,
    ) -> Result<Self> {
        let sentiment = loader.load_adapter(sentiment).await?;
        check_sentiment_labels(sentiment.as_ref())?;
        let sarcasm = loader.load_adapter(sarcasm).await?;
        check_sarcasm_labels(sarcasm.as_ref())?;
        Ok(Self::new(sentiment, sarcasm))
    }

    /// Run one forward pass through each model so failures surface at load time
    pub async fn warm_up(&self) -> Result<()> {
        self.scorer.score(WARMUP_SENTIMENT_TEXT).await?;
        self.detector.detect(WARMUP_SARCASM_TEXT).await?;
        Ok(())
    }

    pub async fn run(&self, text: &str) -> Result<PipelineOutput> {
        let start = Instant::now();

        let raw = self.scorer.score(text).await?;
        let sarcasm_score = self.detector.detect(text).await?;
        let sentiment = self.reconciler.reconcile(raw.clone(), sarcasm_score);

        tracing::debug!(
            raw_label = %raw.label,
            label = %sentiment.label,
            score = sentiment.score,
            sarcasm_score,
            "scoring pipeline complete"
        );

        Ok(PipelineOutput {
            raw,
            sentiment,
            sarcasm_score,
            latency_us: start.elapsed().as_micros() as u64,
        })
    }
}

fn check_sentiment_labels(adapter: &dyn InferenceAdapter) -> Result<()> {
    let labels = adapter.labels();
    let aligned = labels.len() == SENTIMENT_LABELS.len()
        && labels
            .iter()
            .zip(SENTIMENT_LABELS)
            .all(|(label, expected)| label.eq_ignore_ascii_case(expected));

    if !aligned {
        return Err(Error::config(format!(
            "sentiment model '{}' reports labels {:?}, expected {:?}",
            adapter.name(),
            labels,
            SENTIMENT_LABELS
        )));
    }
    Ok(())
}

fn check_sarcasm_labels(adapter: &dyn InferenceAdapter) -> Result<()> {
    if adapter.labels().len() != 2 {
        return Err(Error::config(format!(
            "sarcasm model '{}' reports {} labels, expected 2",
            adapter.name(),
            adapter.labels().len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{LexiconSarcasmAdapter, LexiconSentimentAdapter};

    fn lexicon_pipeline() -> ScoringPipeline {
        ScoringPipeline::new(
            Arc::new(LexiconSentimentAdapter::new().unwrap()),
            Arc::new(LexiconSarcasmAdapter::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_lexicon_pipeline_sarcastic_positive() {
        let pipeline = lexicon_pipeline();
        let out = pipeline
            .run("Oh great, it broke on day one. Just what I needed. Amazing.")
            .await
            .unwrap();

        assert_eq!(out.raw.label, "positive");
        assert_eq!(out.sentiment.label, "sarcastically positive (actually negative)");
        assert!(out.sarcasm().is_sarcastic);
        assert!(out.sentiment.score < out.raw.score);
    }

    #[tokio::test]
    async fn test_lexicon_pipeline_plain_negative() {
        let pipeline = lexicon_pipeline();
        let out = pipeline.run("Terrible quality, awful support.").await.unwrap();
        assert_eq!(out.sentiment.label, "negative");
        assert!(!out.sarcasm().is_sarcastic);
    }

    #[tokio::test]
    async fn test_warm_up() {
        assert!(lexicon_pipeline().warm_up().await.is_ok());
    }
}
