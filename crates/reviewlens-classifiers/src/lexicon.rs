//! Lightweight lexicon adapters
//!
//! Used when no transformer weights are configured. Both adapters honour
//! the scorer's negation fusing: a polar word directly preceded by a fused
//! negator (`not_good`, `don't_like`, `never_again`) counts for the
//! opposite pole.

use crate::inference::{Distribution, InferenceAdapter};
use aho_corasick::{AhoCorasick, MatchKind};
use reviewlens_core::calibration::{NEGATION_WORDS, SENTIMENT_LABELS};
use reviewlens_core::{Error, Result};
use std::time::Instant;

pub struct LexiconSentimentAdapter {
    name: String,
    labels: Vec<String>,
    positive: AhoCorasick,
    negative: AhoCorasick,
}

impl LexiconSentimentAdapter {
    pub fn new() -> Result<Self> {
        Self::with_name("sentiment-lexicon")
    }

    pub fn with_name(name: impl Into<String>) -> Result<Self> {
        let positive = vec![
            "good",
            "great",
            "excellent",
            "love",
            "amazing",
            "wonderful",
            "happy",
            "fantastic",
            "awesome",
            "best",
            "perfect",
            "recommend",
            "worth",
            "like",
        ];
        let negative = vec![
            "bad",
            "terrible",
            "awful",
            "hate",
            "horrible",
            "worst",
            "sad",
            "angry",
            "disappointed",
            "poor",
            "broken",
            "waste",
            "useless",
            "refund",
        ];

        Ok(Self {
            name: name.into(),
            labels: SENTIMENT_LABELS.iter().map(|l| l.to_string()).collect(),
            positive: build_matcher(&positive, "positive sentiment")?,
            negative: build_matcher(&negative, "negative sentiment")?,
        })
    }

    fn polar_hits(&self, text: &str) -> (f32, f32) {
        let mut positive = 0.0;
        let mut negative = 0.0;

        for (matcher, is_positive) in [(&self.positive, true), (&self.negative, false)] {
            for mat in matcher.find_iter(text) {
                if !is_word(text, mat.start(), mat.end()) {
                    continue;
                }
                let flipped = is_negated(&text[..mat.start()]);
                if is_positive != flipped {
                    positive += 1.0;
                } else {
                    negative += 1.0;
                }
            }
        }
        (positive, negative)
    }
}

#[async_trait::async_trait]
impl InferenceAdapter for LexiconSentimentAdapter {
    async fn infer(&self, text: &str) -> Result<Distribution> {
        let start = Instant::now();
        let (positive, negative) = self.polar_hits(text);
        let total = positive + negative;

        // More polar hits mean less neutral mass
        let confidence = (total + 1.0) / (total + 2.0);
        let probabilities = if total == 0.0 {
            vec![0.2, 0.6, 0.2]
        } else {
            vec![
                confidence * negative / total,
                1.0 - confidence,
                confidence * positive / total,
            ]
        };

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

pub struct LexiconSarcasmAdapter {
    name: String,
    labels: Vec<String>,
    cues: AhoCorasick,
}

impl LexiconSarcasmAdapter {
    pub fn new() -> Result<Self> {
        Self::with_name("sarcasm-lexicon")
    }

    pub fn with_name(name: impl Into<String>) -> Result<Self> {
        let cues = vec![
            "yeah right",
            "oh great",
            "oh wonderful",
            "just what i needed",
            "just great",
            "thanks for nothing",
            "thanks a lot",
            "what a surprise",
            "so much fun",
            "could cry",
            "said no one ever",
            "wow, just wow",
            "totally worth it",
            "can't wait to do that again",
            "/s",
        ];

        Ok(Self {
            name: name.into(),
            labels: vec!["not_sarcastic".to_string(), "sarcastic".to_string()],
            cues: build_matcher(&cues, "sarcasm cue")?,
        })
    }
}

#[async_trait::async_trait]
impl InferenceAdapter for LexiconSarcasmAdapter {
    async fn infer(&self, text: &str) -> Result<Distribution> {
        let start = Instant::now();
        let hits = self.cues.find_iter(text).count() as f32;

        let sarcastic = if hits == 0.0 {
            0.05
        } else {
            (0.55 + 0.2 * hits).min(0.95)
        };

        Ok(Distribution {
            probabilities: vec![1.0 - sarcastic, sarcastic],
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

fn build_matcher(patterns: &[&str], what: &str) -> Result<AhoCorasick> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(patterns)
        .map_err(|e| Error::internal(format!("Failed to build {what} matcher: {e}")))
}

/// Match must not sit inside a longer word
fn is_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let boundary_before = before.map_or(true, |c| !c.is_alphanumeric() || c == '_');
    let boundary_after = after.map_or(true, |c| !c.is_alphanumeric());
    boundary_before && boundary_after
}

/// Whether the text right before a match ends in a fused negator
fn is_negated(prefix: &str) -> bool {
    let Some(head) = prefix.strip_suffix('_') else {
        return false;
    };
    let word = head
        .rsplit(|c: char| c.is_whitespace() || c == '_')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    word == "not" || word.ends_with("n't") || NEGATION_WORDS.contains(&word.as_str())
}
