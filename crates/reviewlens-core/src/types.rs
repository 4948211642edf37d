//! Core types for ReviewLens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::calibration::SENTIMENT_LABELS;
use crate::error::Error;

pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_USERNAME: &str = "Anonymous";

/// The three labels the sentiment model can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseLabel {
    Negative,
    Neutral,
    Positive,
}

impl BaseLabel {
    /// All labels in model output order
    pub const ALL: [BaseLabel; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    pub fn as_str(&self) -> &'static str {
        SENTIMENT_LABELS[self.index()]
    }

    /// Position of this label in the model's probability vector
    pub fn index(&self) -> usize {
        match self {
            Self::Negative => 0,
            Self::Neutral => 1,
            Self::Positive => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for BaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub text: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub star_rating: i64,
    pub language: String,
    pub username: String,
    pub helpful_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Descriptor for a review about to be inserted
///
/// Analysis inserts only carry text and sentiment; the remaining fields
/// take the store defaults unless set (seed data sets all of them).
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub text: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub star_rating: i64,
    pub language: String,
    pub username: String,
    pub helpful_count: i64,
}

impl NewReview {
    /// Create a review with default rating, language, username and helpfulness
    pub fn new(text: impl Into<String>, sentiment: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            sentiment: sentiment.into(),
            sentiment_score: score,
            star_rating: 0,
            language: DEFAULT_LANGUAGE.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            helpful_count: 0,
        }
    }

    /// Project a reconciled sentiment into an insert, keeping the score in [0,1]
    pub fn from_sentiment(text: impl Into<String>, sentiment: &SentimentResult) -> Self {
        let score = ((sentiment.score as f64).clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0;
        Self::new(text, sentiment.label.clone(), score)
    }

    pub fn with_rating(mut self, rating: i64) -> Self {
        self.star_rating = rating;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_helpful_count(mut self, count: i64) -> Self {
        self.helpful_count = count;
        self
    }

    /// Check the insert against the review invariants
    pub fn validate(&self) -> crate::Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::validation("review text cannot be empty"));
        }
        if !(0.0..=1.0).contains(&self.sentiment_score) {
            return Err(Error::validation(format!(
                "sentiment score {} outside [0, 1]",
                self.sentiment_score
            )));
        }
        if !(0..=5).contains(&self.star_rating) {
            return Err(Error::validation(format!(
                "star rating {} outside [0, 5]",
                self.star_rating
            )));
        }
        if self.helpful_count < 0 {
            return Err(Error::validation("helpful count cannot be negative"));
        }
        Ok(())
    }
}

/// Labeled sentiment with the model's percentage distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: String,
    pub score: f32,
    /// Base label -> percentage (0-100, two decimals)
    pub full_distribution: BTreeMap<String, f32>,
}

impl SentimentResult {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
            full_distribution: BTreeMap::new(),
        }
    }

    pub fn with_distribution(mut self, distribution: BTreeMap<String, f32>) -> Self {
        self.full_distribution = distribution;
        self
    }
}

/// Sarcasm likelihood as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SarcasmResult {
    pub score: f32,
    pub is_sarcastic: bool,
}

/// Full-table aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_reviews: usize,
    pub sentiment_distribution: BTreeMap<String, usize>,
}

/// Response payload for one successful analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub sentiment: SentimentResult,
    pub sarcasm: SarcasmResult,
    pub language: String,
    pub stats: ReviewStats,
}
