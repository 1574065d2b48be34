//! TTL-bounded in-memory cache with insertion-time eviction.
//!
//! Eviction policy: fixed maximum entry count; when full, `set` evicts the
//! single entry with the oldest creation timestamp (not LRU — access does not
//! refresh an entry's position). `get` treats an entry older than its TTL as
//! a miss and removes it. A background sweeper bounds memory growth from
//! entries that are never looked up again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio::time::interval;

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Logically expired once age exceeds the TTL, whether or not it has
    /// been physically evicted yet.
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.ttl
    }
}

/// Counters exposed by [`TtlCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired_removals: u64,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expired_removals: u64,
}

/// Process-local TTL cache. Cheap to clone; clones share the same store.
pub struct TtlCache<V> {
    inner: Arc<Mutex<CacheInner<V>>>,
    max_entries: usize,
    default_ttl: Duration,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            max_entries: self.max_entries,
            default_ttl: self.default_ttl,
        }
    }
}

impl<V: Clone + Send + 'static> TtlCache<V> {
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                evictions: 0,
                expired_removals: 0,
            })),
            max_entries: max_entries.max(1),
            default_ttl,
        }
    }

    /// Insert a value. When at capacity, the entry with the smallest creation
    /// timestamp is evicted first.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let mut inner = self.inner.lock().await;

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest_key) = oldest {
                inner.entries.remove(&oldest_key);
                inner.evictions += 1;
                tracing::debug!(key = %oldest_key, "Cache at capacity, evicted oldest entry");
            }
        }

        inner.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
            },
        );
    }

    /// Look up a value. An entry past its TTL is removed and reported as a
    /// miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        match inner.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                inner.entries.remove(key);
                inner.expired_removals += 1;
                inner.misses += 1;
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().await;
        inner.entries.remove(key).is_some()
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expired_removals: inner.expired_removals,
        }
    }

    /// Remove every expired entry, independent of `get` activity.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - inner.entries.len();
        inner.expired_removals += removed as u64;
        removed
    }

    /// Spawn the background sweep task. The returned handle stops the task
    /// when shut down; dropping the handle leaves the task running until the
    /// process exits.
    pub fn spawn_sweeper(&self, sweep_interval: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let cache = self.clone();

        tokio::spawn(async move {
            let mut tick = interval(sweep_interval);
            // First tick fires immediately; skip it so a fresh cache is not
            // swept before anything is inserted.
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let removed = cache.purge_expired().await;
                        if removed > 0 {
                            tracing::debug!(removed, "Cache sweep removed expired entries");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("Cache sweeper shutting down");
                        break;
                    }
                }
            }
        });

        SweeperHandle { shutdown_tx }
    }
}

/// Handle for the background sweeper task.
#[derive(Clone)]
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SweeperHandle {
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(()).await.is_err() {
            tracing::warn!("Cache sweeper already stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max: usize, ttl_ms: u64) -> TtlCache<String> {
        TtlCache::new(max, Duration::from_millis(ttl_ms))
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = cache(10, 1000);
        cache.set("a", "one".to_string(), None).await;
        assert_eq!(cache.get("a").await, Some("one".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing_is_miss() {
        let cache = cache(10, 1000);
        assert_eq!(cache.get("nope").await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_get() {
        let cache = cache(10, 10);
        cache.set("a", "one".to_string(), None).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("a").await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.entries, 0, "expired entry must be removed by get");
        assert_eq!(stats.expired_removals, 1);
    }

    #[tokio::test]
    async fn test_per_entry_ttl_overrides_default() {
        let cache = cache(10, 10_000);
        cache
            .set("short", "v".to_string(), Some(Duration::from_millis(10)))
            .await;
        cache.set("long", "v".to_string(), None).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("short").await, None);
        assert_eq!(cache.get("long").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_capacity_never_exceeded() {
        let cache = cache(3, 10_000);
        for i in 0..10 {
            cache.set(format!("k{}", i), "v".to_string(), None).await;
        }
        let stats = cache.stats().await;
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.evictions, 7);
    }

    #[tokio::test]
    async fn test_eviction_removes_oldest_by_creation() {
        let cache = cache(2, 10_000);
        cache.set("first", "1".to_string(), None).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.set("second", "2".to_string(), None).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Reading "first" must not protect it: eviction is by creation time.
        assert!(cache.get("first").await.is_some());
        cache.set("third", "3".to_string(), None).await;

        assert_eq!(cache.get("first").await, None);
        assert!(cache.get("second").await.is_some());
        assert!(cache.get("third").await.is_some());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache = cache(2, 10_000);
        cache.set("a", "1".to_string(), None).await;
        cache.set("b", "2".to_string(), None).await;
        cache.set("a", "3".to_string(), None).await;

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.evictions, 0);
        assert_eq!(cache.get("a").await, Some("3".to_string()));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let cache = cache(10, 10_000);
        cache.set("a", "1".to_string(), None).await;
        cache.set("b", "2".to_string(), None).await;

        assert!(cache.delete("a").await);
        assert!(!cache.delete("a").await);
        cache.clear().await;
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_background_sweep_purges_unread_entries() {
        let cache = cache(10, 10);
        cache.set("a", "1".to_string(), None).await;
        cache.set("b", "2".to_string(), None).await;

        let sweeper = cache.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(60)).await;

        // Entries gone without any get() activity.
        assert_eq!(cache.stats().await.entries, 0);
        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_purge_expired_counts_removed() {
        let cache = cache(10, 10);
        cache.set("a", "1".to_string(), None).await;
        cache
            .set("b", "2".to_string(), Some(Duration::from_secs(60)))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.stats().await.entries, 1);
    }
}
