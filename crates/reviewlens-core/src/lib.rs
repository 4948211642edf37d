//! ReviewLens Core
//!
//! Core types and utilities shared across ReviewLens components.
//!
//! This crate provides:
//! - The persisted review model and the transient analysis results
//! - Error types and result handling
//! - Calibration constants for the sentiment and sarcasm heuristics

pub mod calibration;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    AnalysisRecord, BaseLabel, NewReview, Review, ReviewStats, SarcasmResult, SentimentResult,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        AnalysisRecord, BaseLabel, NewReview, Review, ReviewStats, SarcasmResult,
        SentimentResult,
    };
}
