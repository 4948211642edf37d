//! Heuristic calibration constants
//!
//! These are tunable model-calibration parameters for the scoring pipeline.
//! Keep control flow out of this module.

/// Sentiment labels in the order the sentiment model emits them
pub const SENTIMENT_LABELS: [&str; 3] = ["negative", "neutral", "positive"];

/// Words whose trailing space is fused so the tokenizer keeps the negation
pub const NEGATION_WORDS: [&str; 8] = [
    "never", "no", "nothing", "nowhere", "none", "nobody", "neither", "nor",
];

/// Boost applied to a winning negative probability when a negation word is present
pub const NEGATION_BOOST: f32 = 1.20;

/// Boost applied to a winning negative probability otherwise
pub const NEGATIVE_BOOST: f32 = 1.15;

/// Sarcasm score above which positive/neutral labels are rewritten
pub const SARCASM_REWRITE_THRESHOLD: f32 = 0.6;

/// Sarcasm score above which a response reports `is_sarcastic`
pub const SARCASM_REPORT_THRESHOLD: f32 = 0.5;

/// Score increase when a neutral label becomes "potentially negative"
pub const NEUTRAL_SARCASM_BOOST: f32 = 0.25;

/// Negative scores below this receive [`WEAK_NEGATIVE_BOOST`]
pub const WEAK_NEGATIVE_CEILING: f32 = 0.70;

/// Negative scores below this (and at least [`WEAK_NEGATIVE_CEILING`]) receive [`MEDIUM_NEGATIVE_BOOST`]
pub const MEDIUM_NEGATIVE_CEILING: f32 = 0.85;

pub const WEAK_NEGATIVE_BOOST: f32 = 0.20;

pub const MEDIUM_NEGATIVE_BOOST: f32 = 0.10;

/// Label for positive text judged sarcastic
pub const SARCASTIC_POSITIVE_LABEL: &str = "sarcastically positive (actually negative)";

/// Label for neutral text judged sarcastic
pub const POTENTIALLY_NEGATIVE_LABEL: &str = "potentially negative";

/// Round to a fixed number of decimal places
pub fn round_to(value: f32, places: i32) -> f32 {
    let factor = 10f64.powi(places);
    ((value as f64 * factor).round() / factor) as f32
}
