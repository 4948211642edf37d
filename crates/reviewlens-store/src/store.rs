//! Review store trait and query filter

use reviewlens_core::{Error, NewReview, Result, Review, ReviewStats};

/// Wildcard accepted for the sentiment and language filters
pub const MATCH_ALL: &str = "all";

/// Append-only review store with mutable rating and helpfulness counters.
///
/// Every operation is atomic with respect to the others. Reviews are never
/// deleted and ids are never reused.
pub trait ReviewStore: Send + Sync {
    /// Persist a review and return its store-assigned id
    fn insert(&self, review: NewReview) -> Result<i64>;

    /// Persist a review and return the aggregate that includes it.
    ///
    /// Both happen as one unit: if the aggregate cannot be read the review
    /// is not kept.
    fn record(&self, review: NewReview) -> Result<(i64, ReviewStats)>;

    /// Reviews matching the query, newest first (ties broken by id, descending)
    fn filter(&self, query: &ReviewQuery) -> Result<Vec<Review>>;

    /// Set the star rating; ratings outside [0, 5] are rejected
    fn set_rating(&self, id: i64, rating: i64) -> Result<()>;

    /// Increment, or decrement floored at zero, the helpful counter
    fn adjust_helpful(&self, id: i64, increment: bool) -> Result<()>;

    /// Aggregate over the whole store, recomputed on each call
    fn stats(&self) -> Result<ReviewStats>;

    /// Number of stored reviews
    fn count(&self) -> Result<usize>;
}

/// Conjunctive filter over stored reviews
///
/// Unset fields, the `all` wildcard, a non-positive rating and an empty
/// search string all mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewQuery {
    /// Exact sentiment label
    pub sentiment: Option<String>,

    /// Minimum star rating (inclusive)
    pub min_rating: Option<i64>,

    /// Exact language name
    pub language: Option<String>,

    /// Case-insensitive substring of the review text
    pub search: Option<String>,
}

impl ReviewQuery {
    /// Create a new empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by sentiment label
    pub fn sentiment(mut self, sentiment: impl Into<String>) -> Self {
        self.sentiment = Some(sentiment.into());
        self
    }

    /// Filter by minimum star rating
    pub fn min_rating(mut self, rating: i64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    /// Filter by language
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Filter by text substring
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sentiment_filter(&self) -> Option<&str> {
        active_label(self.sentiment.as_deref())
    }

    pub fn rating_filter(&self) -> Option<i64> {
        self.min_rating.filter(|rating| *rating > 0)
    }

    pub fn language_filter(&self) -> Option<&str> {
        active_label(self.language.as_deref())
    }

    pub fn search_filter(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    /// Check if a review matches the query
    pub fn matches(&self, review: &Review) -> bool {
        if let Some(sentiment) = self.sentiment_filter() {
            if review.sentiment != sentiment {
                return false;
            }
        }

        if let Some(rating) = self.rating_filter() {
            if review.star_rating < rating {
                return false;
            }
        }

        if let Some(language) = self.language_filter() {
            if review.language != language {
                return false;
            }
        }

        // ASCII-only case folding, same as SQLite LIKE
        if let Some(search) = self.search_filter() {
            let haystack = review.text.to_ascii_lowercase();
            if !haystack.contains(&search.to_ascii_lowercase()) {
                return false;
            }
        }

        true
    }
}

fn active_label(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != MATCH_ALL)
}

/// Reject ratings outside [0, 5] before touching storage
pub(crate) fn check_rating(rating: i64) -> Result<()> {
    if (0..=5).contains(&rating) {
        Ok(())
    } else {
        Err(Error::validation(format!("rating {rating} outside [0, 5]")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn review(text: &str, sentiment: &str, rating: i64, language: &str) -> Review {
        Review {
            id: 1,
            text: text.to_string(),
            sentiment: sentiment.to_string(),
            sentiment_score: 0.5,
            star_rating: rating,
            language: language.to_string(),
            username: "Anonymous".to_string(),
            helpful_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_wildcards_disable_filters() {
        let query = ReviewQuery::new()
            .sentiment("all")
            .language("all")
            .min_rating(0)
            .search("");
        assert_eq!(query.sentiment_filter(), None);
        assert_eq!(query.language_filter(), None);
        assert_eq!(query.rating_filter(), None);
        assert_eq!(query.search_filter(), None);
        assert!(query.matches(&review("anything", "Positive", 0, "French")));
    }

    #[test]
    fn test_sentiment_is_case_sensitive() {
        let query = ReviewQuery::new().sentiment("Positive");
        assert!(query.matches(&review("x", "Positive", 0, "English")));
        assert!(!query.matches(&review("x", "positive", 0, "English")));
    }

    #[test]
    fn test_min_rating_inclusive() {
        let query = ReviewQuery::new().min_rating(3);
        assert!(query.matches(&review("x", "Neutral", 3, "English")));
        assert!(!query.matches(&review("x", "Neutral", 2, "English")));
    }

    #[test]
    fn test_search_case_insensitive_literal() {
        let query = ReviewQuery::new().search("WORTH");
        assert!(query.matches(&review("Not worth the money.", "Negative", 2, "English")));

        let query = ReviewQuery::new().search("100%");
        assert!(query.matches(&review("100% happy", "Positive", 5, "English")));
        assert!(!query.matches(&review("100 happy", "Positive", 5, "English")));
    }

    #[test]
    fn test_check_rating() {
        assert!(check_rating(0).is_ok());
        assert!(check_rating(5).is_ok());
        assert!(check_rating(-1).is_err());
        assert!(check_rating(6).is_err());
    }
}
