//! Per-request analysis flow
//!
//! Loads (or reloads) the model pair, scores the text, writes the review
//! through to the store and reports the outcome as a single value. A review
//! is stored only after scoring succeeds.

use reviewlens_classifiers::{AdapterLoader, PipelineOutput, ScoringPipeline};
use reviewlens_core::{AnalysisRecord, Error, NewReview, Result};
use reviewlens_store::ReviewStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Holder for the loaded model pair
///
/// Empty until the first successful load. A reload swaps in a fresh pair
/// atomically; in-flight requests keep the pair they started with.
pub struct ModelSlot {
    loader: Arc<dyn AdapterLoader>,
    sentiment_model: String,
    sarcasm_model: String,
    current: RwLock<Option<Arc<ScoringPipeline>>>,
}

impl ModelSlot {
    pub fn new(
        loader: Arc<dyn AdapterLoader>,
        sentiment_model: impl Into<String>,
        sarcasm_model: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            sentiment_model: sentiment_model.into(),
            sarcasm_model: sarcasm_model.into(),
            current: RwLock::new(None),
        }
    }

    pub async fn is_ready(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Load the pair if it is not loaded yet
    pub async fn load(&self) -> Result<Arc<ScoringPipeline>> {
        if let Some(pipeline) = self.current.read().await.as_ref() {
            return Ok(pipeline.clone());
        }

        let mut current = self.current.write().await;
        if let Some(pipeline) = current.as_ref() {
            return Ok(pipeline.clone());
        }

        let pipeline = self.build().await?;
        *current = Some(pipeline.clone());
        Ok(pipeline)
    }

    /// Replace the pair unconditionally
    pub async fn reload(&self) -> Result<Arc<ScoringPipeline>> {
        let mut current = self.current.write().await;
        *current = None;
        let pipeline = self.build().await?;
        *current = Some(pipeline.clone());
        Ok(pipeline)
    }

    /// Replace `failed` unless a concurrent request already did
    async fn reload_after_failure(&self, failed: &Arc<ScoringPipeline>) -> Result<Arc<ScoringPipeline>> {
        let mut current = self.current.write().await;
        if let Some(pipeline) = current.as_ref() {
            if !Arc::ptr_eq(pipeline, failed) {
                return Ok(pipeline.clone());
            }
        }

        *current = None;
        let pipeline = self.build().await?;
        *current = Some(pipeline.clone());
        Ok(pipeline)
    }

    async fn build(&self) -> Result<Arc<ScoringPipeline>> {
        info!(
            sentiment = %self.sentiment_model,
            sarcasm = %self.sarcasm_model,
            "Loading scoring models"
        );
        let pipeline = ScoringPipeline::load_named(
            self.loader.as_ref(),
            &self.sentiment_model,
            &self.sarcasm_model,
        )
        .await?;
        pipeline.warm_up().await?;
        info!("Scoring models ready");
        Ok(Arc::new(pipeline))
    }
}

/// Why an analysis did not produce a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Caller input rejected (400)
    InvalidInput,
    /// Models could not be loaded (503)
    ModelUnavailable,
    /// Scoring exceeded the configured bound (503)
    Timeout,
    /// Scoring failed with loaded models (500)
    Analysis,
    /// Storage or other internal failure (500)
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub error: String,
    pub details: String,
}

impl AnalysisFailure {
    pub fn new(kind: FailureKind, error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            kind,
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn empty_text() -> Self {
        Self::new(FailureKind::InvalidInput, "Invalid input", "Text field cannot be empty")
    }

    pub fn model_unavailable() -> Self {
        Self::new(
            FailureKind::ModelUnavailable,
            "Model initialization failed",
            "Failed to load required models. Please try again later.",
        )
    }

    fn from_error(err: &Error) -> Self {
        match err {
            Error::Validation(_) => Self::empty_text(),
            Error::Timeout => Self::new(
                FailureKind::Timeout,
                "Analysis timed out",
                "The models did not respond in time. Please try again later.",
            ),
            Error::Inference(_) => Self::new(
                FailureKind::Analysis,
                "Analysis execution failed",
                "An error occurred while processing the text",
            ),
            _ => Self::new(
                FailureKind::Internal,
                "Server error",
                "An internal server error occurred",
            ),
        }
    }

    fn metric_label(&self) -> &'static str {
        match self.kind {
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::ModelUnavailable => "model_unavailable",
            FailureKind::Timeout => "timeout",
            FailureKind::Analysis => "analysis",
            FailureKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Success(AnalysisRecord),
    Failure(AnalysisFailure),
}

pub struct AnalysisOrchestrator {
    models: ModelSlot,
    store: Arc<dyn ReviewStore>,
    timeout: Option<Duration>,
}

impl AnalysisOrchestrator {
    pub fn new(models: ModelSlot, store: Arc<dyn ReviewStore>) -> Self {
        Self {
            models,
            store,
            timeout: None,
        }
    }

    /// Bound each scoring pass
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn models(&self) -> &ModelSlot {
        &self.models
    }

    pub async fn analyze(&self, text: &str, language: &str) -> AnalysisOutcome {
        let start = Instant::now();
        let outcome = match self.try_analyze(text, language).await {
            Ok(record) => AnalysisOutcome::Success(record),
            Err(failure) => {
                metrics::counter!("reviewlens_errors_total", "kind" => failure.metric_label())
                    .increment(1);
                AnalysisOutcome::Failure(failure)
            }
        };

        metrics::histogram!("reviewlens_analysis_latency_us")
            .record(start.elapsed().as_micros() as f64);
        outcome
    }

    async fn try_analyze(
        &self,
        text: &str,
        language: &str,
    ) -> std::result::Result<AnalysisRecord, AnalysisFailure> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnalysisFailure::empty_text());
        }

        let pipeline = self.models.load().await.map_err(|e| {
            error!("Model loading error: {}", e);
            AnalysisFailure::model_unavailable()
        })?;

        let output = match self.score(&pipeline, text).await {
            Ok(output) => output,
            Err(e) if e.is_inference() => {
                warn!("Inference failed, reloading models: {}", e);
                let fresh = self
                    .models
                    .reload_after_failure(&pipeline)
                    .await
                    .map_err(|e| {
                        error!("Model reload failed: {}", e);
                        AnalysisFailure::model_unavailable()
                    })?;

                self.score(&fresh, text).await.map_err(|e| {
                    error!("Analysis runtime error after reload: {}", e);
                    AnalysisFailure::from_error(&e)
                })?
            }
            Err(e) => {
                error!("Analysis error: {}", e);
                return Err(AnalysisFailure::from_error(&e));
            }
        };

        let review = NewReview::from_sentiment(text, &output.sentiment);
        let (_, stats) = self.store.record(review).map_err(|e| {
            error!("Storage error: {}", e);
            AnalysisFailure::from_error(&e)
        })?;

        Ok(AnalysisRecord {
            sarcasm: output.sarcasm(),
            sentiment: output.sentiment,
            language: language.to_string(),
            stats,
        })
    }

    async fn score(&self, pipeline: &ScoringPipeline, text: &str) -> Result<PipelineOutput> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pipeline.run(text))
                .await
                .map_err(|_| Error::Timeout)?,
            None => pipeline.run(text).await,
        }
    }
}
