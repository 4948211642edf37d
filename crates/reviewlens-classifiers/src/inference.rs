//! Inference adapter trait and common types

use async_trait::async_trait;
use reviewlens_core::Result;

/// Trait for every model backend the scorers run on
///
/// Adapters are read-only after construction and shared across requests.
#[async_trait]
pub trait InferenceAdapter: Send + Sync {
    /// Run a forward pass and return one probability per label
    async fn infer(&self, text: &str) -> Result<Distribution>;

    /// Get the adapter name
    fn name(&self) -> &str;

    /// Labels in the order probabilities are reported
    fn labels(&self) -> &[String];
}

/// Output of one forward pass
#[derive(Debug, Clone)]
pub struct Distribution {
    /// Probabilities, aligned with the adapter's labels
    pub probabilities: Vec<f32>,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl Distribution {
    /// Create a new distribution
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self {
            probabilities,
            latency_us: 0,
        }
    }

    /// Index and value of the highest probability (first wins on ties, NaN skipped)
    pub fn argmax(&self) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, &prob) in self.probabilities.iter().enumerate() {
            if prob.is_nan() {
                continue;
            }
            match best {
                Some((_, current)) if prob <= current => {}
                _ => best = Some((idx, prob)),
            }
        }
        best
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.probabilities.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}
