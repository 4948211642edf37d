//! In-process review store

use crate::store::{check_rating, ReviewQuery, ReviewStore};
use chrono::Utc;
use parking_lot::RwLock;
use reviewlens_core::{Error, NewReview, Result, Review, ReviewStats};
use std::cmp::Reverse;

#[derive(Debug, Default)]
struct Inner {
    reviews: Vec<Review>,
    next_id: i64,
}

impl Inner {
    fn push(&mut self, review: NewReview) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        self.reviews.push(Review {
            id,
            text: review.text,
            sentiment: review.sentiment,
            sentiment_score: review.sentiment_score,
            star_rating: review.star_rating,
            language: review.language,
            username: review.username,
            helpful_count: review.helpful_count,
            created_at: Utc::now(),
        });
        id
    }

    fn stats(&self) -> ReviewStats {
        let mut stats = ReviewStats {
            total_reviews: self.reviews.len(),
            ..Default::default()
        };
        for review in &self.reviews {
            *stats
                .sentiment_distribution
                .entry(review.sentiment.clone())
                .or_insert(0) += 1;
        }
        stats
    }
}

/// Volatile store for tests and demos; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryReviewStore {
    inner: RwLock<Inner>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReviewStore for MemoryReviewStore {
    fn insert(&self, review: NewReview) -> Result<i64> {
        review.validate()?;

        Ok(self.inner.write().push(review))
    }

    fn record(&self, review: NewReview) -> Result<(i64, ReviewStats)> {
        review.validate()?;

        let mut inner = self.inner.write();
        let id = inner.push(review);
        Ok((id, inner.stats()))
    }

    fn filter(&self, query: &ReviewQuery) -> Result<Vec<Review>> {
        let inner = self.inner.read();
        let mut reviews: Vec<Review> = inner
            .reviews
            .iter()
            .filter(|review| query.matches(review))
            .cloned()
            .collect();
        reviews.sort_by_key(|review| Reverse((review.created_at, review.id)));
        Ok(reviews)
    }

    fn set_rating(&self, id: i64, rating: i64) -> Result<()> {
        check_rating(rating)?;

        let mut inner = self.inner.write();
        let review = inner
            .reviews
            .iter_mut()
            .find(|review| review.id == id)
            .ok_or(Error::NotFound(id))?;
        review.star_rating = rating;
        Ok(())
    }

    fn adjust_helpful(&self, id: i64, increment: bool) -> Result<()> {
        let mut inner = self.inner.write();
        let review = inner
            .reviews
            .iter_mut()
            .find(|review| review.id == id)
            .ok_or(Error::NotFound(id))?;

        review.helpful_count = if increment {
            review.helpful_count + 1
        } else {
            (review.helpful_count - 1).max(0)
        };
        Ok(())
    }

    fn stats(&self) -> Result<ReviewStats> {
        Ok(self.inner.read().stats())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.inner.read().reviews.len())
    }
}
