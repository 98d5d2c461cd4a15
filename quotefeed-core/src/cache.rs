//! Time- and size-bounded page cache.
//!
//! Feeds refresh many securities concurrently and often hit the same page URL
//! more than once within a few minutes. The cache keeps the last fetched
//! artifact per key so those fetches are served locally.
//!
//! - Entries older than the TTL are evicted on lookup and never returned.
//! - The map holds at most `capacity` entries. Inserting beyond that evicts
//!   the oldest inserted entry (bounded size, not LRU-on-read).
//! - All access is serialized through one internal mutex.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default time-to-live of a cached page: five minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of cached pages.
pub const DEFAULT_CAPACITY: usize = 50;

/// A cached value and the moment it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: Instant,
}

#[derive(Debug)]
struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    insertion_order: VecDeque<String>,
}

impl<T> CacheState<T> {
    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.insertion_order.retain(|k| k != key);
    }
}

/// Thread-safe page cache keyed by an opaque string (URL or composite key).
#[derive(Debug)]
pub struct PageCache<T> {
    state: Mutex<CacheState<T>>,
    ttl: Duration,
    capacity: usize,
}

impl<T: Clone> PageCache<T> {
    /// Create a cache with the given TTL and capacity. A capacity of zero is
    /// treated as one.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Return the cached value for `key` unless it is absent or expired.
    pub fn lookup(&self, key: &str) -> Option<T> {
        let mut state = self.lock();

        let expired = match state.entries.get(key) {
            None => return None,
            Some(entry) => entry.stored_at.elapsed() >= self.ttl,
        };

        if expired {
            state.remove(key);
            return None;
        }

        state.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store `value` under `key`, evicting the oldest entries beyond capacity.
    ///
    /// Re-storing an existing key refreshes its value and age but keeps its
    /// original insertion position.
    pub fn put(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        let mut state = self.lock();

        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
        };

        if state.entries.insert(key.clone(), entry).is_none() {
            state.insertion_order.push_back(key);
        }

        while state.entries.len() > self.capacity {
            match state.insertion_order.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    /// Number of entries currently held, including not yet evicted expired ones.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for PageCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lookup_before_ttl_returns_value() {
        let cache = PageCache::new(Duration::from_secs(60), 10);
        cache.put("https://example.com/a", "page a".to_string());
        assert_eq!(
            cache.lookup("https://example.com/a"),
            Some("page a".to_string())
        );
    }

    #[test]
    fn lookup_missing_key() {
        let cache: PageCache<String> = PageCache::default();
        assert_eq!(cache.lookup("nothing"), None);
    }

    #[test]
    fn expired_entry_is_evicted_and_can_be_stored_again() {
        let cache = PageCache::new(Duration::from_millis(10), 10);
        cache.put("key", 1);
        std::thread::sleep(Duration::from_millis(15));

        assert_eq!(cache.lookup("key"), None);
        assert!(cache.is_empty());

        cache.put("key", 2);
        assert_eq!(cache.lookup("key"), Some(2));
    }

    #[test]
    fn oldest_entry_evicted_at_capacity() {
        let cache = PageCache::new(Duration::from_secs(60), 2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup("a"), None);
        assert_eq!(cache.lookup("b"), Some(2));
        assert_eq!(cache.lookup("c"), Some(3));
    }

    #[test]
    fn reading_does_not_protect_from_eviction() {
        let cache = PageCache::new(Duration::from_secs(60), 2);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.lookup("a"), Some(1));
        cache.put("c", 3);
        assert_eq!(cache.lookup("a"), None);
    }

    #[test]
    fn re_put_keeps_insertion_position() {
        let cache = PageCache::new(Duration::from_secs(60), 2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 10);
        cache.put("c", 3);

        assert_eq!(cache.lookup("a"), None);
        assert_eq!(cache.lookup("b"), Some(2));
    }

    #[test]
    fn concurrent_access_is_serialized() {
        let cache = Arc::new(PageCache::new(Duration::from_secs(60), 50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("{t}-{i}");
                        cache.put(key.clone(), i);
                        let _ = cache.lookup(&key);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 50);
    }
}
