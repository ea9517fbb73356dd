//! Short-lived read-through caching for slow-changing reads.
//!
//! Concurrent misses for one key share a single upstream fetch. A failed
//! fetch falls back to the previous value for that key, however old.

use crate::error::{Result, SpotifyError};
use crate::types::PlaylistSummary;
use curator_core::UserId;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

struct Slots<K, V> {
    entries: HashMap<K, Entry<V>>,
    in_flight: HashMap<K, SharedFetch<V>>,
}

/// One keyspace of cached values.
pub struct ReadThroughCache<K, V> {
    namespace: &'static str,
    slots: Arc<Mutex<Slots<K, V>>>,
}

impl<K, V> Clone for ReadThroughCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace,
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K, V> ReadThroughCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            slots: Arc::new(Mutex::new(Slots {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            })),
        }
    }

    /// Return the cached value for `key` if it is fresh, otherwise join or
    /// start a fetch.
    ///
    /// The fetch runs on its own task, so it completes and fills the cache
    /// even if every caller waiting on it goes away.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, ttl: Duration, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let pending = {
            let mut slots = self.slots.lock().await;

            if let Some(entry) = slots.entries.get(&key) {
                if entry.expires_at > Instant::now() {
                    debug!(cache = self.namespace, key = ?key, "Cache hit");
                    return Ok(entry.value.clone());
                }
            }

            if let Some(pending) = slots.in_flight.get(&key) {
                debug!(cache = self.namespace, key = ?key, "Joining in-flight fetch");
                pending.clone()
            } else {
                let pending = self.spawn_fetch(key.clone(), ttl, fetch());
                slots.in_flight.insert(key, pending.clone());
                pending
            }
        };

        pending.await
    }

    fn spawn_fetch<Fut>(&self, key: K, ttl: Duration, fetch: Fut) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let namespace = self.namespace;

        // The caller holds the lock until the in-flight slot is registered,
        // so this task cannot clear the slot before it exists.
        let task = tokio::spawn(async move {
            let result = fetch.await;
            let mut slots = slots.lock().await;
            slots.in_flight.remove(&key);

            match result {
                Ok(value) => {
                    slots.entries.insert(
                        key,
                        Entry {
                            value: value.clone(),
                            expires_at: Instant::now() + ttl,
                        },
                    );
                    Ok(value)
                }
                Err(err) => match slots.entries.get(&key) {
                    Some(stale) => {
                        warn!(cache = namespace, key = ?key, error = %err, "Fetch failed, serving stale value");
                        Ok(stale.value.clone())
                    }
                    None => Err(err),
                },
            }
        });

        async move {
            task.await
                .map_err(|e| SpotifyError::Internal(format!("cache fetch task failed: {e}")))?
        }
        .boxed()
        .shared()
    }
}

/// TTLs per catalog keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub playlists: Duration,
    pub playlist_name: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            playlists: Duration::from_secs(5 * 60),
            playlist_name: Duration::from_secs(10 * 60),
        }
    }
}

/// The catalog caches shared by every request.
#[derive(Clone)]
pub struct CatalogCache {
    pub(crate) playlists: ReadThroughCache<UserId, Vec<PlaylistSummary>>,
    pub(crate) playlist_names: ReadThroughCache<(UserId, String), Option<String>>,
    pub(crate) ttls: CacheTtls,
}

impl CatalogCache {
    pub fn new(ttls: CacheTtls) -> Self {
        Self {
            playlists: ReadThroughCache::new("playlists"),
            playlist_names: ReadThroughCache::new("playlist_names"),
            ttls,
        }
    }

    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(CacheTtls::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(60);

    fn counting_fetch(
        counter: &Arc<AtomicUsize>,
        result: Result<u32>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32>> {
        let counter = Arc::clone(counter);
        move || {
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                result
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_fetch() {
        let cache: ReadThroughCache<u32, u32> = ReadThroughCache::new("test");
        let counter = Arc::new(AtomicUsize::new(0));

        let calls = (0..10).map(|_| cache.get_or_fetch(1, TTL, counting_fetch(&counter, Ok(42))));
        let results = futures_util::future::join_all(calls).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(results.into_iter().all(|r| r.unwrap() == 42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_hit_skips_fetch_until_expiry() {
        let cache: ReadThroughCache<u32, u32> = ReadThroughCache::new("test");
        let counter = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch(1, TTL, counting_fetch(&counter, Ok(1)))
            .await
            .unwrap();
        let hit = cache
            .get_or_fetch(1, TTL, counting_fetch(&counter, Ok(2)))
            .await
            .unwrap();
        assert_eq!(hit, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        let refreshed = cache
            .get_or_fetch(1, TTL, counting_fetch(&counter, Ok(3)))
            .await
            .unwrap();
        assert_eq!(refreshed, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_serves_stale_value() {
        let cache: ReadThroughCache<u32, u32> = ReadThroughCache::new("test");
        let counter = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch(1, TTL, counting_fetch(&counter, Ok(7)))
            .await
            .unwrap();
        tokio::time::advance(TTL * 10).await;

        let rate_limited = Err(SpotifyError::RateLimited {
            retry_after_secs: Some(3),
            body: String::new(),
        });
        let value = cache
            .get_or_fetch(1, TTL, counting_fetch(&counter, rate_limited))
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_without_prior_value_propagates() {
        let cache: ReadThroughCache<u32, u32> = ReadThroughCache::new("test");
        let counter = Arc::new(AtomicUsize::new(0));

        let err = cache
            .get_or_fetch(1, TTL, counting_fetch(&counter, Err(SpotifyError::NoAccessToken)))
            .await
            .unwrap_err();
        assert!(matches!(err, SpotifyError::NoAccessToken));

        // Failure is not cached
        let value = cache
            .get_or_fetch(1, TTL, counting_fetch(&counter, Ok(5)))
            .await
            .unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_do_not_share_entries() {
        let cache: ReadThroughCache<(u32, &'static str), u32> = ReadThroughCache::new("test");
        let counter = Arc::new(AtomicUsize::new(0));

        let a = cache
            .get_or_fetch((1, "P1"), TTL, counting_fetch(&counter, Ok(1)))
            .await
            .unwrap();
        let b = cache
            .get_or_fetch((2, "P1"), TTL, counting_fetch(&counter, Ok(2)))
            .await
            .unwrap();

        assert_eq!((a, b), (1, 2));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_default_ttls() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.playlists, Duration::from_secs(300));
        assert_eq!(ttls.playlist_name, Duration::from_secs(600));
    }
}
