// Response cache with stale-while-revalidate semantics
use crate::domain::role::VisibilityScope;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: String,
    scope: String,
    filters: String,
}

impl CacheKey {
    /// `filters` must be a canonical rendering of the request filters
    pub fn new(endpoint: &str, scope: VisibilityScope, filters: String) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            scope: scope.cache_tag(),
            filters,
        }
    }
}

struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
    refreshing: bool,
}

enum Lookup<V> {
    Fresh(V),
    Revalidate(V),
    Miss,
}

pub struct QueryCache<V> {
    entries: DashMap<CacheKey, CacheEntry<V>>,
    ttl: Duration,
    stale: Duration,
    max_entries: usize,
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, stale: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            stale,
            max_entries: max_entries.max(1),
        }
    }

    /// Serve a fresh entry as is; serve a stale one while reloading it in the
    /// background (one reload per key at a time); load inline otherwise.
    /// Failed loads are never cached.
    pub async fn get_or_load<F, Fut>(self: &Arc<Self>, key: CacheKey, loader: F) -> anyhow::Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        match self.lookup(&key) {
            Lookup::Fresh(value) => Ok(value),
            Lookup::Revalidate(value) => {
                let cache = Arc::clone(self);
                let reload = loader();
                tokio::spawn(async move {
                    match reload.await {
                        Ok(fresh) => cache.insert(key, fresh),
                        Err(e) => {
                            tracing::warn!("Background refresh of {:?} failed: {:#}", key, e);
                            if let Some(mut entry) = cache.entries.get_mut(&key) {
                                entry.refreshing = false;
                            }
                        }
                    }
                });
                Ok(value)
            }
            Lookup::Miss => {
                let value = loader().await?;
                self.insert(key, value.clone());
                Ok(value)
            }
        }
    }

    fn lookup(&self, key: &CacheKey) -> Lookup<V> {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return Lookup::Miss;
        };

        let age = entry.fetched_at.elapsed();
        if age < self.ttl {
            Lookup::Fresh(entry.value.clone())
        } else if age < self.ttl + self.stale {
            if entry.refreshing {
                Lookup::Fresh(entry.value.clone())
            } else {
                entry.refreshing = true;
                Lookup::Revalidate(entry.value.clone())
            }
        } else {
            Lookup::Miss
        }
    }

    /// Never holds more than `max_entries`: expired entries go first, then the
    /// oldest fetches.
    fn insert(&self, key: CacheKey, value: V) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            let horizon = self.ttl + self.stale;
            self.entries.retain(|_, entry| entry.fetched_at.elapsed() < horizon);

            if self.entries.len() >= self.max_entries {
                self.evict_oldest(self.entries.len() + 1 - self.max_entries);
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                refreshing: false,
            },
        );
    }

    fn evict_oldest(&self, count: usize) {
        let mut by_age: Vec<(Instant, CacheKey)> = self
            .entries
            .iter()
            .map(|entry| (entry.value().fetched_at, entry.key().clone()))
            .collect();
        by_age.sort_by_key(|(fetched_at, _)| *fetched_at);

        for (_, key) in by_age.into_iter().take(count) {
            self.entries.remove(&key);
        }
        tracing::debug!("Evicted {} cache entries over the {} entry cap", count, self.max_entries);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(filters: &str) -> CacheKey {
        CacheKey::new("wordcloud", VisibilityScope::All, filters.to_string())
    }

    async fn load(cache: &Arc<QueryCache<usize>>, counter: &Arc<AtomicUsize>, filters: &str) -> usize {
        let counter = Arc::clone(counter);
        cache
            .get_or_load(key(filters), move || async move {
                Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_entries_are_reused() {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(60), Duration::ZERO, 16));
        let counter = Arc::new(AtomicUsize::new(0));

        assert_eq!(load(&cache, &counter, "fy=2024-25").await, 1);
        assert_eq!(load(&cache, &counter, "fy=2024-25").await, 1);
        assert_eq!(load(&cache, &counter, "fy=2023-24").await, 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_entry_served_then_refreshed() {
        let cache = Arc::new(QueryCache::new(Duration::ZERO, Duration::from_secs(60), 16));
        let counter = Arc::new(AtomicUsize::new(0));

        assert_eq!(load(&cache, &counter, "").await, 1);
        // stale: old value served, reload runs in the background
        assert_eq!(load(&cache, &counter, "").await, 1);

        for _ in 0..50 {
            if counter.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(load(&cache, &counter, "").await, 2);
    }

    #[tokio::test]
    async fn test_expired_entries_reload_inline() {
        let cache = Arc::new(QueryCache::new(Duration::ZERO, Duration::ZERO, 16));
        let counter = Arc::new(AtomicUsize::new(0));

        assert_eq!(load(&cache, &counter, "").await, 1);
        assert_eq!(load(&cache, &counter, "").await, 2);
    }

    #[tokio::test]
    async fn test_unique_filters_never_grow_past_cap() {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(60), Duration::from_secs(60), 3));
        let counter = Arc::new(AtomicUsize::new(0));

        for i in 0..10 {
            load(&cache, &counter, &format!("fy=garbage-{}", i)).await;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(cache.len(), 3);

        // the newest survive, the oldest were evicted
        assert_eq!(load(&cache, &counter, "fy=garbage-9").await, 10);
        assert_eq!(load(&cache, &counter, "fy=garbage-0").await, 11);
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: Arc<QueryCache<usize>> = Arc::new(QueryCache::new(Duration::from_secs(60), Duration::ZERO, 16));

        let failed = cache
            .get_or_load(key(""), || async { Err::<usize, _>(anyhow::anyhow!("database down")) })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.len(), 0);

        let counter = Arc::new(AtomicUsize::new(0));
        assert_eq!(load(&cache, &counter, "").await, 1);
    }
}
