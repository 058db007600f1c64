//! Storage seams of the coordinator.
//!
//! - [`ResultStore`] persists the latest [`ScoreRecord`] per restaurant.
//! - [`ReviewStore`] supplies the reviews a score is computed from (read-only).
//!
//! Both are implemented by the SQLite [`Database`] and by in-memory stores
//! used for tests and embedding.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(feature = "sqlite")]
mod import;

use async_trait::async_trait;

use crate::types::records::{RestaurantId, ReviewSet, ScoreRecord};
use crate::JakasResult;

pub use memory::{MemoryResultStore, MemoryReviewStore};
#[cfg(feature = "sqlite")]
pub use import::{ImportFile, ImportSummary, ImportedRestaurant};
#[cfg(feature = "sqlite")]
pub use sqlite::{Database, DatabaseCounts};

/// Durable access to score records, keyed by restaurant.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Looks up the latest record. Absence is `Ok(None)`, never an error.
    async fn get(&self, id: &RestaurantId) -> JakasResult<Option<ScoreRecord>>;

    /// Inserts or replaces the record for `record.restaurant_id` (last write wins).
    async fn put(&self, record: ScoreRecord) -> JakasResult<()>;

    /// Returns every stored record.
    async fn list(&self) -> JakasResult<Vec<ScoreRecord>>;
}

/// Read-only access to restaurant reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Reviews of a restaurant in insertion order. No reviews is an empty set.
    async fn list_reviews(&self, id: &RestaurantId) -> JakasResult<ReviewSet>;

    /// Whether the restaurant is known at all.
    async fn restaurant_exists(&self, id: &RestaurantId) -> JakasResult<bool>;
}
