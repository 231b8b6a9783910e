//! Response cache with in-flight request coalescing.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::cache::TtlCache;
use crate::error::MarketError;
use crate::rate_limit::RateLimiter;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, MarketError>>>;

/// A time-bounded cache in front of the upstream API.
///
/// On a hit the stored value is returned without touching the rate limiter. On a miss
/// (or a stale entry) the fetch runs after [`RateLimiter::acquire`], and a successful
/// result is stored under the key, replacing any older entry.
///
/// Concurrent misses for the same key share one fetch. Each caller may abandon its
/// wait at any time by dropping the future; the fetch itself is only cancelled when no
/// caller is left waiting for it.
pub struct ResponseCache<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

struct CacheInner<K, V> {
    /// Completed responses
    entries: Mutex<TtlCache<K, V>>,
    /// Fetches that have been started but not finished
    inflight: Mutex<HashMap<K, InflightFetch<V>>>,
    limiter: RateLimiter,
    next_fetch_id: AtomicU64,
}

struct InflightFetch<V> {
    id: u64,
    fetch: SharedFetch<V>,
    waiters: usize,
}

enum Lookup<K, V>
where
    K: Hash + Eq,
{
    Hit(V),
    Pending(SharedFetch<V>, Waiter<K, V>),
}

impl<K, V> ResponseCache<K, V>
where
    K: Hash + Eq + Clone + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries stay fresh for `freshness_window`.
    pub fn new(freshness_window: Duration, limiter: RateLimiter) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(TtlCache::new(freshness_window)),
                inflight: Mutex::new(HashMap::new()),
                limiter,
                next_fetch_id: AtomicU64::new(0),
            }),
        }
    }

    /// Return the fresh value stored under `key`, or fetch, store and return it.
    ///
    /// `fetch` is only invoked on a miss and only by the first of several concurrent
    /// callers. Errors are passed through untouched and leave the cache unchanged.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V, MarketError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, MarketError>> + Send + 'static,
    {
        match self.lookup(key, fetch) {
            Lookup::Hit(value) => Ok(value),
            Lookup::Pending(shared, _waiter) => shared.await,
        }
    }

    /// Get a fresh cached value without fetching.
    pub fn get(&self, key: &K) -> Option<V> {
        lock(&self.inner.entries).get(key).cloned()
    }

    /// Check whether a fresh value is cached for `key`.
    pub fn contains(&self, key: &K) -> bool {
        lock(&self.inner.entries).contains(key)
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        lock(&self.inner.entries).len()
    }

    /// Check if nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        lock(&self.inner.entries).is_empty()
    }

    /// Number of fetches currently in flight.
    pub fn inflight_count(&self) -> usize {
        lock(&self.inner.inflight).len()
    }

    /// Drop every stored entry. In-flight fetches are not affected.
    pub fn clear(&self) {
        lock(&self.inner.entries).clear();
    }

    /// The limiter consulted on every miss.
    pub fn limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    fn lookup<F, Fut>(&self, key: K, fetch: F) -> Lookup<K, V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, MarketError>> + Send + 'static,
    {
        // Lock order is always inflight, then entries.
        let mut inflight = lock(&self.inner.inflight);

        if let Some(value) = lock(&self.inner.entries).get(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Lookup::Hit(value.clone());
        }

        let (shared, id) = match inflight.get_mut(&key) {
            Some(pending) => {
                tracing::debug!("Joining in-flight fetch for {}", key);
                pending.waiters += 1;
                (pending.fetch.clone(), pending.id)
            }
            None => {
                tracing::debug!("Cache miss for {}", key);
                let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                let shared = self.start_fetch(key.clone(), id, fetch());
                inflight.insert(
                    key.clone(),
                    InflightFetch {
                        id,
                        fetch: shared.clone(),
                        waiters: 1,
                    },
                );
                (shared, id)
            }
        };

        let waiter = Waiter {
            inner: Arc::clone(&self.inner),
            key,
            id,
        };
        Lookup::Pending(shared, waiter)
    }

    fn start_fetch<Fut>(&self, key: K, id: u64, fetch: Fut) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V, MarketError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        async move {
            inner.limiter.acquire().await;
            let result = fetch.await;
            inner.finish(&key, id, &result);
            result
        }
        .boxed()
        .shared()
    }
}

impl<K, V> CacheInner<K, V>
where
    K: Hash + Eq + Clone + Display,
    V: Clone,
{
    /// Store a successful result and retire the in-flight entry.
    fn finish(&self, key: &K, id: u64, result: &Result<V, MarketError>) {
        let mut inflight = lock(&self.inflight);

        match result {
            Ok(value) => {
                lock(&self.entries).insert(key.clone(), value.clone());
                tracing::debug!("Cached response for {}", key);
            }
            Err(err) => tracing::debug!("Fetch for {} failed, nothing cached: {}", key, err),
        }

        let finished = match inflight.get(key) {
            Some(pending) if pending.id == id => inflight.remove(key),
            _ => None,
        };
        drop(inflight);
        drop(finished);
    }
}

impl<K, V> std::fmt::Debug for ResponseCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("limiter", &self.inner.limiter)
            .finish_non_exhaustive()
    }
}

impl<K, V> Clone for ResponseCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Registration of one caller waiting on an in-flight fetch.
///
/// Dropping the last waiter of a fetch that has not finished yet removes it, which
/// drops the underlying request future.
struct Waiter<K, V>
where
    K: Hash + Eq,
{
    inner: Arc<CacheInner<K, V>>,
    key: K,
    id: u64,
}

impl<K, V> Drop for Waiter<K, V>
where
    K: Hash + Eq,
{
    fn drop(&mut self) {
        let mut inflight = lock(&self.inner.inflight);

        let abandoned = match inflight.get_mut(&self.key) {
            Some(pending) if pending.id == self.id => {
                pending.waiters = pending.waiters.saturating_sub(1);
                if pending.waiters == 0 {
                    inflight.remove(&self.key)
                } else {
                    None
                }
            }
            _ => None,
        };
        drop(inflight);

        if abandoned.is_some() {
            tracing::debug!("Last waiter gone, cancelling in-flight fetch");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
