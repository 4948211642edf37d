//! ReviewLens Store
//!
//! Persistence for analyzed reviews behind the [`ReviewStore`] trait:
//! - [`SqliteReviewStore`]: durable, single-file SQLite database
//! - [`MemoryReviewStore`]: volatile, for tests and demos
//!
//! Reviews are append-only; only the star rating and helpful counter change
//! after insert.

pub mod memory;
pub mod seed;
pub mod sqlite;
pub mod store;

pub use memory::MemoryReviewStore;
pub use seed::seed_if_empty;
pub use sqlite::SqliteReviewStore;
pub use store::{ReviewQuery, ReviewStore, MATCH_ALL};
