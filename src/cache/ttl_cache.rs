//! Time-to-live map for memoized upstream responses.
//!
//! Entries are never purged on read. An entry older than the TTL is simply ignored
//! and gets overwritten by the next insert under the same key.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use gecko_market_client::cache::TtlCache;
//!
//! let mut cache: TtlCache<String, Vec<u32>> = TtlCache::new(Duration::from_secs(300));
//!
//! cache.insert("coins-usd-1-50".to_string(), vec![1, 2, 3]);
//! assert!(cache.get(&"coins-usd-1-50".to_string()).is_some());
//! assert!(cache.get(&"coins-eur-1-50".to_string()).is_none());
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// A map whose entries count as present only while younger than a fixed TTL.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    cache: HashMap<K, (V, Instant)>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq,
{
    /// Create a new TTL cache with the specified time-to-live duration.
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: HashMap::new(),
            ttl,
        }
    }

    /// Insert a value, timestamped with the current time.
    ///
    /// Any previous entry under the same key is replaced.
    pub fn insert(&mut self, key: K, value: V) {
        self.cache.insert(key, (value, Instant::now()));
    }

    /// Get a reference to a value if it exists and is still fresh.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.cache
            .get(key)
            .and_then(|(value, stored_at)| self.is_fresh(*stored_at).then_some(value))
    }

    /// Check if a key exists and is still fresh.
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Get the number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Clear all entries from the cache.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    fn is_fresh(&self, stored_at: Instant) -> bool {
        stored_at.elapsed() < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(60));

        cache.insert("key1".to_string(), 100);
        assert_eq!(cache.get(&"key1".to_string()), Some(&100));
        assert_eq!(cache.get(&"key2".to_string()), None);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(60));

        cache.insert("key1".to_string(), 100);
        cache.insert("key1".to_string(), 200);
        assert_eq!(cache.get(&"key1".to_string()), Some(&200));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiration_keeps_entry_in_memory() {
        let mut cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(300));

        cache.insert("key1".to_string(), 100);
        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.contains(&"key1".to_string()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&"key1".to_string()).is_none());
        assert_eq!(cache.len(), 1);

        cache.insert("key1".to_string(), 200);
        assert_eq!(cache.get(&"key1".to_string()), Some(&200));
    }
}
