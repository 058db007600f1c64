//! In-memory stores.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::records::{RestaurantId, ReviewSet, ScoreRecord};
use crate::JakasResult;

use super::{ResultStore, ReviewStore};

/// Result store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    records: RwLock<HashMap<RestaurantId, ScoreRecord>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn get(&self, id: &RestaurantId) -> JakasResult<Option<ScoreRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put(&self, record: ScoreRecord) -> JakasResult<()> {
        self.records
            .write()
            .await
            .insert(record.restaurant_id.clone(), record);
        Ok(())
    }

    async fn list(&self) -> JakasResult<Vec<ScoreRecord>> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.restaurant_id.cmp(&b.restaurant_id));
        Ok(records)
    }
}

/// Review store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryReviewStore {
    reviews: RwLock<HashMap<RestaurantId, ReviewSet>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a restaurant with its reviews.
    #[must_use]
    pub fn with_restaurant(mut self, id: impl Into<RestaurantId>, reviews: ReviewSet) -> Self {
        self.reviews.get_mut().insert(id.into(), reviews);
        self
    }

    /// Replaces the reviews of a restaurant.
    pub async fn set_reviews(&self, id: impl Into<RestaurantId>, reviews: ReviewSet) {
        self.reviews.write().await.insert(id.into(), reviews);
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn list_reviews(&self, id: &RestaurantId) -> JakasResult<ReviewSet> {
        Ok(self.reviews.read().await.get(id).cloned().unwrap_or_default())
    }

    async fn restaurant_exists(&self, id: &RestaurantId) -> JakasResult<bool> {
        Ok(self.reviews.read().await.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::records::{Review, ScoreEstimate};
    use chrono::Utc;

    fn record(id: &str, compare_fun: f64) -> ScoreRecord {
        ScoreRecord::new(
            id.into(),
            ScoreEstimate::new(compare_fun, "comment"),
            &ReviewSet::default(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_get_absent() {
        let store = MemoryResultStore::new();
        assert!(store.get(&"missing".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_last_write_wins() {
        let store = MemoryResultStore::new();
        store.put(record("r1", 0.3)).await.unwrap();
        store.put(record("r1", 0.9)).await.unwrap();

        let stored = store.get(&"r1".into()).await.unwrap().unwrap();
        assert_eq!(stored.compare_fun, 0.9);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_restaurant_has_no_reviews() {
        let store = MemoryReviewStore::new()
            .with_restaurant("r1", ReviewSet::new(vec![Review::new("Duże porcje", 5.0)]));

        assert_eq!(store.list_reviews(&"r1".into()).await.unwrap().len(), 1);
        assert!(store.list_reviews(&"r2".into()).await.unwrap().is_empty());
        assert!(store.restaurant_exists(&"r1".into()).await.unwrap());
        assert!(!store.restaurant_exists(&"r2".into()).await.unwrap());
    }
}
