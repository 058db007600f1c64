//! Write-through LRU result store.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use lru::LruCache;

use crate::store::ResultStore;
use crate::types::records::{RestaurantId, ScoreRecord};
use crate::JakasResult;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Lookups served from memory.
    pub hits: u64,

    /// Lookups that went to the wrapped store.
    pub misses: u64,
}

impl CacheStats {
    /// Calculates the hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// [`ResultStore`] that keeps the most recently used records in memory.
///
/// Freshness is not judged here: the coordinator decides whether a record is
/// usable. The LRU assumes it is the only writer of the wrapped store.
pub struct CachedResultStore {
    inner: Arc<dyn ResultStore>,
    cache: Mutex<LruCache<RestaurantId, ScoreRecord>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedResultStore {
    /// Wraps `inner` with an LRU of `capacity` entries (100 when zero).
    pub fn new(inner: Arc<dyn ResultStore>, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lru(&self) -> MutexGuard<'_, LruCache<RestaurantId, ScoreRecord>> {
        // A poisoned LRU only ever holds complete records
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drops a single entry from memory.
    pub fn invalidate(&self, id: &RestaurantId) {
        self.lru().pop(id);
    }

    /// Drops every entry from memory.
    pub fn clear(&self) {
        self.lru().clear();
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let lru = self.lru();
        CacheStats {
            size: lru.len(),
            capacity: lru.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl ResultStore for CachedResultStore {
    async fn get(&self, id: &RestaurantId) -> JakasResult<Option<ScoreRecord>> {
        let hit = self.lru().get(id).cloned();
        if let Some(record) = hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(record));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let Some(record) = self.inner.get(id).await? else {
            return Ok(None);
        };

        // A put may have landed while the wrapped store was read
        let mut lru = self.lru();
        let newer = lru
            .peek(id)
            .filter(|cached| cached.computed_at >= record.computed_at)
            .cloned();
        if let Some(newer) = newer {
            return Ok(Some(newer));
        }
        lru.put(id.clone(), record.clone());
        Ok(Some(record))
    }

    async fn put(&self, record: ScoreRecord) -> JakasResult<()> {
        self.inner.put(record.clone()).await?;
        self.lru().put(record.restaurant_id.clone(), record);
        Ok(())
    }

    async fn list(&self) -> JakasResult<Vec<ScoreRecord>> {
        self.inner.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryResultStore;
    use crate::types::records::{ReviewSet, ScoreEstimate};
    use chrono::Utc;
    use tokio::sync::{Notify, Semaphore};

    fn record(id: &str, compare_fun: f64) -> ScoreRecord {
        ScoreRecord::new(
            id.into(),
            ScoreEstimate::new(compare_fun, "Mogłoby być lepiej"),
            &ReviewSet::default(),
            Utc::now(),
        )
    }

    fn cached(capacity: usize) -> (Arc<MemoryResultStore>, CachedResultStore) {
        let inner = Arc::new(MemoryResultStore::new());
        let cache = CachedResultStore::new(inner.clone(), capacity);
        (inner, cache)
    }

    #[tokio::test]
    async fn test_cache_hit_after_put() {
        let (_inner, cache) = cached(10);
        cache.put(record("r1", 0.6)).await.unwrap();

        let found = cache.get(&"r1".into()).await.unwrap();
        assert_eq!(found.unwrap().compare_fun, 0.6);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_miss_populates_from_inner() {
        let (inner, cache) = cached(10);
        inner.put(record("r1", 0.7)).await.unwrap();

        assert!(cache.get(&"r1".into()).await.unwrap().is_some()); // Miss
        assert!(cache.get(&"r1".into()).await.unwrap().is_some()); // Hit

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_absent_is_not_cached() {
        let (_inner, cache) = cached(10);
        assert!(cache.get(&"ghost".into()).await.unwrap().is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn test_put_writes_through() {
        let (inner, cache) = cached(10);
        cache.put(record("r1", 0.9)).await.unwrap();
        assert_eq!(inner.get(&"r1".into()).await.unwrap().unwrap().compare_fun, 0.9);
    }

    #[tokio::test]
    async fn test_lru_eviction_falls_back_to_inner() {
        let (_inner, cache) = cached(2);
        cache.put(record("r1", 0.1)).await.unwrap();
        cache.put(record("r2", 0.2)).await.unwrap();
        cache.put(record("r3", 0.3)).await.unwrap(); // Evicts r1 from memory

        assert_eq!(cache.stats().size, 2);
        // Still served, from the wrapped store
        assert!(cache.get(&"r1".into()).await.unwrap().is_some());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let (_inner, cache) = cached(10);
        cache.put(record("r1", 0.1)).await.unwrap();
        cache.put(record("r2", 0.2)).await.unwrap();

        cache.invalidate(&"r1".into());
        assert_eq!(cache.stats().size, 1);

        cache.clear();
        assert_eq!(cache.stats().size, 0);
    }

    /// Wrapped store whose reads stall until released.
    struct StallingStore {
        inner: MemoryResultStore,
        read_done: Notify,
        release: Semaphore,
    }

    #[async_trait]
    impl ResultStore for StallingStore {
        async fn get(&self, id: &RestaurantId) -> JakasResult<Option<ScoreRecord>> {
            let record = self.inner.get(id).await;
            self.read_done.notify_one();
            self.release.acquire().await.unwrap().forget();
            record
        }

        async fn put(&self, record: ScoreRecord) -> JakasResult<()> {
            self.inner.put(record).await
        }

        async fn list(&self) -> JakasResult<Vec<ScoreRecord>> {
            self.inner.list().await
        }
    }

    #[tokio::test]
    async fn test_slow_miss_does_not_overwrite_newer_put() {
        let inner = Arc::new(StallingStore {
            inner: MemoryResultStore::new(),
            read_done: Notify::new(),
            release: Semaphore::new(0),
        });
        let mut old = record("r1", 0.1);
        old.computed_at = Utc::now() - chrono::Duration::hours(1);
        inner.inner.put(old).await.unwrap();

        let cache = Arc::new(CachedResultStore::new(inner.clone(), 10));
        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get(&"r1".into()).await })
        };

        // The reader holds the old record; a newer one is written meanwhile
        inner.read_done.notified().await;
        cache.put(record("r1", 0.9)).await.unwrap();
        inner.release.add_permits(1);

        let served = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(served.compare_fun, 0.9);

        let cached = cache.get(&"r1".into()).await.unwrap().unwrap();
        assert_eq!(cached.compare_fun, 0.9);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_zero_capacity_uses_default() {
        let cache = CachedResultStore::new(Arc::new(MemoryResultStore::new()), 0);
        assert_eq!(cache.stats().capacity, 100);
    }
}
