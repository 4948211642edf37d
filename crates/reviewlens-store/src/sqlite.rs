//! SQLite-backed review store
//!
//! One `reviews` table behind a single connection. Every mutation is a
//! single statement, so atomicity comes from SQLite itself; the mutex only
//! serializes access to the connection handle. `record` is the exception
//! and wraps its insert and aggregate in one transaction.

use crate::store::{check_rating, ReviewQuery, ReviewStore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reviewlens_core::{Error, NewReview, Result, Review, ReviewStats};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    sentiment TEXT NOT NULL,
    sentiment_score REAL NOT NULL CHECK (sentiment_score BETWEEN 0 AND 1),
    star_rating INTEGER NOT NULL DEFAULT 0 CHECK (star_rating BETWEEN 0 AND 5),
    language TEXT NOT NULL DEFAULT 'English',
    username TEXT NOT NULL DEFAULT 'Anonymous',
    helpful_count INTEGER NOT NULL DEFAULT 0 CHECK (helpful_count >= 0),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
CREATE INDEX IF NOT EXISTS idx_reviews_created ON reviews(created_at DESC, id DESC);
";

const SELECT_COLUMNS: &str = "SELECT id, text, sentiment, sentiment_score, star_rating, \
     language, username, helpful_count, created_at FROM reviews";

pub struct SqliteReviewStore {
    conn: Mutex<Connection>,
}

impl SqliteReviewStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(storage)?;
        info!("Opened review database at {}", path.display());
        Self::init(conn)
    }

    /// Private database that lives as long as the store
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(storage)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ReviewStore for SqliteReviewStore {
    fn insert(&self, review: NewReview) -> Result<i64> {
        review.validate()?;
        insert_review(&self.conn.lock(), &review)
    }

    fn record(&self, review: NewReview) -> Result<(i64, ReviewStats)> {
        review.validate()?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(storage)?;
        let id = insert_review(&tx, &review)?;
        let stats = read_stats(&tx)?;
        tx.commit().map_err(storage)?;
        Ok((id, stats))
    }

    fn filter(&self, query: &ReviewQuery) -> Result<Vec<Review>> {
        let mut clauses = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(sentiment) = query.sentiment_filter() {
            clauses.push("sentiment = ?");
            values.push(Value::Text(sentiment.to_string()));
        }
        if let Some(rating) = query.rating_filter() {
            clauses.push("star_rating >= ?");
            values.push(Value::Integer(rating));
        }
        if let Some(language) = query.language_filter() {
            clauses.push("language = ?");
            values.push(Value::Text(language.to_string()));
        }
        if let Some(search) = query.search_filter() {
            clauses.push("text LIKE ? ESCAPE '\\'");
            values.push(Value::Text(format!("%{}%", escape_like(search))));
        }

        let mut sql = SELECT_COLUMNS.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql).map_err(storage)?;
        let rows = stmt
            .query_map(params_from_iter(values), review_from_row)
            .map_err(storage)?;

        let reviews = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage)?;
        Ok(reviews)
    }

    fn set_rating(&self, id: i64, rating: i64) -> Result<()> {
        check_rating(rating)?;

        let changed = self
            .conn
            .lock()
            .execute(
                "UPDATE reviews SET star_rating = ?1 WHERE id = ?2",
                params![rating, id],
            )
            .map_err(storage)?;

        if changed == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    fn adjust_helpful(&self, id: i64, increment: bool) -> Result<()> {
        let sql = if increment {
            "UPDATE reviews SET helpful_count = helpful_count + 1 WHERE id = ?1"
        } else {
            "UPDATE reviews SET helpful_count = MAX(helpful_count - 1, 0) WHERE id = ?1"
        };

        let changed = self
            .conn
            .lock()
            .execute(sql, params![id])
            .map_err(storage)?;

        if changed == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    fn stats(&self) -> Result<ReviewStats> {
        read_stats(&self.conn.lock())
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
            .map_err(storage)?;
        Ok(count as usize)
    }
}

fn insert_review(conn: &Connection, review: &NewReview) -> Result<i64> {
    conn.execute(
        "INSERT INTO reviews (text, sentiment, sentiment_score, star_rating, language, username, helpful_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            review.text,
            review.sentiment,
            review.sentiment_score,
            review.star_rating,
            review.language,
            review.username,
            review.helpful_count,
        ],
    )
    .map_err(storage)?;

    let id = conn.last_insert_rowid();
    debug!(id, sentiment = %review.sentiment, "review inserted");
    Ok(id)
}

fn read_stats(conn: &Connection) -> Result<ReviewStats> {
    let mut stmt = conn
        .prepare("SELECT sentiment, COUNT(*) FROM reviews GROUP BY sentiment")
        .map_err(storage)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(storage)?;

    let mut stats = ReviewStats::default();
    for row in rows {
        let (sentiment, count) = row.map_err(storage)?;
        let count = count as usize;
        stats.total_reviews += count;
        stats.sentiment_distribution.insert(sentiment, count);
    }
    Ok(stats)
}

fn storage(err: rusqlite::Error) -> Error {
    Error::storage(err.to_string())
}

/// Make `%`, `_` and the escape character itself match literally
fn escape_like(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    let created_at: String = row.get(8)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(Review {
        id: row.get(0)?,
        text: row.get(1)?,
        sentiment: row.get(2)?,
        sentiment_score: row.get(3)?,
        star_rating: row.get(4)?,
        language: row.get(5)?,
        username: row.get(6)?,
        helpful_count: row.get(7)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_schema_defaults() {
        let store = SqliteReviewStore::in_memory().unwrap();
        let id = store
            .insert(NewReview::new("Fine.", "neutral", 0.5))
            .unwrap();

        let reviews = store.filter(&ReviewQuery::new()).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].id, id);
        assert_eq!(reviews[0].language, "English");
        assert_eq!(reviews[0].username, "Anonymous");
        assert_eq!(reviews[0].star_rating, 0);
    }

    #[test]
    fn test_like_wildcards_are_literal() {
        let store = SqliteReviewStore::in_memory().unwrap();
        store.insert(NewReview::new("100% happy", "positive", 0.9)).unwrap();
        store.insert(NewReview::new("1000 happy", "positive", 0.9)).unwrap();
        store.insert(NewReview::new("snake_case", "neutral", 0.5)).unwrap();
        store.insert(NewReview::new("snakeXcase", "neutral", 0.5)).unwrap();

        assert_eq!(store.filter(&ReviewQuery::new().search("0%")).unwrap().len(), 1);
        assert_eq!(store.filter(&ReviewQuery::new().search("e_c")).unwrap().len(), 1);
    }

    #[test]
    fn test_record_returns_stats_including_review() {
        let store = SqliteReviewStore::in_memory().unwrap();
        store.insert(NewReview::new("Meh.", "neutral", 0.5)).unwrap();

        let (id, stats) = store.record(NewReview::new("Love it.", "positive", 0.9)).unwrap();
        assert_eq!(stats.total_reviews, 2);
        assert_eq!(stats.sentiment_distribution["positive"], 1);
        assert_eq!(store.filter(&ReviewQuery::new()).unwrap()[0].id, id);
    }

    #[test]
    fn test_schema_rejects_out_of_range_score() {
        let store = SqliteReviewStore::in_memory().unwrap();
        let result = store.conn.lock().execute(
            "INSERT INTO reviews (text, sentiment, sentiment_score) VALUES ('x', 'negative', 1.5)",
            [],
        );
        assert!(result.is_err());
        assert!(store.record(NewReview::new("x", "negative", 1.5)).is_err());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let store = SqliteReviewStore::in_memory().unwrap();
        assert!(matches!(store.set_rating(42, 3), Err(Error::NotFound(42))));
        assert!(matches!(store.adjust_helpful(42, true), Err(Error::NotFound(42))));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.db");

        {
            let store = SqliteReviewStore::open(&path).unwrap();
            store.insert(NewReview::new("Keeps going.", "positive", 0.8)).unwrap();
        }

        let store = SqliteReviewStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
