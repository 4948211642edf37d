//! Sample reviews loaded into an empty store on first startup

use crate::store::ReviewStore;
use reviewlens_core::{NewReview, Result};
use tracing::info;

/// (text, sentiment, score, rating, language, username, helpful)
const SAMPLE_REVIEWS: [(&str, &str, f64, i64, &str, &str, i64); 4] = [
    ("Great product! Exactly what I needed.", "Positive", 0.95, 5, "English", "John", 3),
    ("Not worth the money.", "Negative", 0.2, 2, "English", "Alice", 1),
    ("It works as expected.", "Neutral", 0.5, 3, "English", "Bob", 0),
    ("Could be better.", "Neutral", 0.4, 3, "English", "Emma", 2),
];

pub fn sample_reviews() -> Vec<NewReview> {
    SAMPLE_REVIEWS
        .iter()
        .map(|&(text, sentiment, score, rating, language, username, helpful)| {
            NewReview::new(text, sentiment, score)
                .with_rating(rating)
                .with_language(language)
                .with_username(username)
                .with_helpful_count(helpful)
        })
        .collect()
}

/// Insert the sample reviews if the store holds none; returns how many were added
pub fn seed_if_empty(store: &dyn ReviewStore) -> Result<usize> {
    if store.count()? > 0 {
        return Ok(0);
    }

    let samples = sample_reviews();
    let inserted = samples.len();
    for review in samples {
        store.insert(review)?;
    }

    info!("Seeded review store with {} sample reviews", inserted);
    Ok(inserted)
}
