//! Sarcasm-aware sentiment reconciliation
//!
//! Sarcasm inverts perceived polarity of positive and neutral text; weak
//! negative calls are pushed harder toward the negative pole than strong
//! ones. Rules apply in order and the negative boost is independent of the
//! sarcasm rewrite. `full_distribution` is never touched.

use reviewlens_core::calibration::{
    round_to, MEDIUM_NEGATIVE_BOOST, MEDIUM_NEGATIVE_CEILING, NEUTRAL_SARCASM_BOOST,
    POTENTIALLY_NEGATIVE_LABEL, SARCASM_REWRITE_THRESHOLD, SARCASTIC_POSITIVE_LABEL,
    WEAK_NEGATIVE_BOOST, WEAK_NEGATIVE_CEILING,
};
use reviewlens_core::{BaseLabel, SentimentResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentSarcasmReconciler;

impl SentimentSarcasmReconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn reconcile(&self, mut sentiment: SentimentResult, sarcasm_score: f32) -> SentimentResult {
        if sarcasm_score > SARCASM_REWRITE_THRESHOLD {
            if sentiment.label == BaseLabel::Positive.as_str() {
                sentiment.label = SARCASTIC_POSITIVE_LABEL.to_string();
                sentiment.score = 1.0 - sentiment.score;
            } else if sentiment.label == BaseLabel::Neutral.as_str() {
                sentiment.label = POTENTIALLY_NEGATIVE_LABEL.to_string();
                sentiment.score = (sentiment.score + NEUTRAL_SARCASM_BOOST).min(1.0);
            }
        }

        if sentiment.label == BaseLabel::Negative.as_str() {
            if sentiment.score < WEAK_NEGATIVE_CEILING {
                sentiment.score = (sentiment.score + WEAK_NEGATIVE_BOOST).min(1.0);
            } else if sentiment.score < MEDIUM_NEGATIVE_CEILING {
                sentiment.score = (sentiment.score + MEDIUM_NEGATIVE_BOOST).min(1.0);
            }
        }

        sentiment.score = round_to(sentiment.score, 4);
        sentiment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(label: &str, score: f32) -> SentimentResult {
        SentimentResult::new(label, score)
    }

    #[test]
    fn test_sarcastic_positive_inverts() {
        let out = SentimentSarcasmReconciler::new().reconcile(result("positive", 0.90), 0.8);
        assert_eq!(out.label, "sarcastically positive (actually negative)");
        assert_eq!(out.score, 0.1);
    }

    #[test]
    fn test_sarcastic_neutral_becomes_potentially_negative() {
        let out = SentimentSarcasmReconciler::new().reconcile(result("neutral", 0.50), 0.65);
        assert_eq!(out.label, "potentially negative");
        assert_eq!(out.score, 0.75);
    }

    #[test]
    fn test_sarcastic_neutral_clamps() {
        let out = SentimentSarcasmReconciler::new().reconcile(result("neutral", 0.9), 0.9);
        assert_eq!(out.score, 1.0);
    }

    #[test]
    fn test_weak_negative_boosted_once() {
        let out = SentimentSarcasmReconciler::new().reconcile(result("negative", 0.50), 0.3);
        assert_eq!(out.label, "negative");
        assert_eq!(out.score, 0.7);
    }

    #[test]
    fn test_medium_negative_boost() {
        let out = SentimentSarcasmReconciler::new().reconcile(result("negative", 0.80), 0.1);
        assert_eq!(out.score, 0.9);
    }

    #[test]
    fn test_strong_negative_unchanged() {
        let out = SentimentSarcasmReconciler::new().reconcile(result("negative", 0.92), 0.1);
        assert_eq!(out.score, 0.92);
    }

    #[test]
    fn test_negative_ignores_sarcasm_rewrite() {
        let out = SentimentSarcasmReconciler::new().reconcile(result("negative", 0.60), 0.95);
        assert_eq!(out.label, "negative");
        assert_eq!(out.score, 0.8);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let out = SentimentSarcasmReconciler::new().reconcile(result("positive", 0.9), 0.6);
        assert_eq!(out.label, "positive");
        assert_eq!(out.score, 0.9);
    }

    #[test]
    fn test_distribution_untouched() {
        let distribution = BTreeMap::from([
            ("negative".to_string(), 5.0),
            ("neutral".to_string(), 5.0),
            ("positive".to_string(), 90.0),
        ]);
        let input = result("positive", 0.9).with_distribution(distribution.clone());
        let out = SentimentSarcasmReconciler::new().reconcile(input, 0.99);
        assert_eq!(out.full_distribution, distribution);
    }
}
