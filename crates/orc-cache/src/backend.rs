use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Point-in-time counters from [`crate::Cache::inspect`]. Lock-free and
/// eventually consistent: a race between two concurrent operations may lose
/// at most one increment, never more (§4.1 concurrency policy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// A cache backend. Implementations must never let a lookup/store error
/// escape as a `Result` — any internal failure (e.g. a `remote_keyvalue`
/// network error) must degrade silently to a miss, per §4.1's failure
/// semantics.
pub trait CacheBackend: Send + Sync {
    fn lookup(&self, key: &str) -> Option<Vec<u8>>;
    fn store(&self, key: &str, payload: Vec<u8>);
    fn inspect(&self) -> CacheStats;
    fn clear(&self);
    fn warm(&self, pairs: Vec<(String, Vec<u8>)>);
}

/// Caching disabled. Every lookup is a miss, every store a no-op.
pub struct NullBackend;

impl CacheBackend for NullBackend {
    fn lookup(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn store(&self, _key: &str, _payload: Vec<u8>) {}

    fn inspect(&self) -> CacheStats {
        CacheStats::default()
    }

    fn clear(&self) {}

    fn warm(&self, _pairs: Vec<(String, Vec<u8>)>) {}
}

struct Entry {
    payload: Vec<u8>,
    inserted_at: Instant,
}

/// LRU-capacity, TTL-expiry in-memory backend. `lookup`/`store` are
/// serialized through a single mutex: correct under concurrent use, with
/// the eviction/expiry policy from §4.1 ("evict the least-recently-used
/// entry that is still non-expired; ties broken by insertion order").
pub struct InMemoryLruTtlBackend {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryLruTtlBackend {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::new(1).unwrap());
        InMemoryLruTtlBackend {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) >= self.ttl
    }
}

impl CacheBackend for InMemoryLruTtlBackend {
    fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        // An expired entry counts as a miss and is removed lazily on
        // access; no background sweeper is required.
        let expired = guard.peek(key).is_some_and(|e| self.is_expired(e, now));
        if expired {
            guard.pop(key);
        }
        match guard.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.payload.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn store(&self, key: &str, payload: Vec<u8>) {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let was_full = guard.len() == guard.cap().get() && !guard.contains(key);
        let evicted = guard.put(
            key.to_string(),
            Entry {
                payload,
                inserted_at: Instant::now(),
            },
        );
        if was_full && evicted.is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn inspect(&self) -> CacheStats {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        CacheStats {
            size: guard.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn clear(&self) {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }

    fn warm(&self, pairs: Vec<(String, Vec<u8>)>) {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        for (key, payload) in pairs {
            guard.put(
                key,
                Entry {
                    payload,
                    inserted_at: now,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_entry_is_a_miss_and_removed_lazily() {
        let backend = InMemoryLruTtlBackend::new(10, Duration::from_millis(1));
        backend.store("k", b"v".to_vec());
        std::thread::sleep(Duration::from_millis(5));
        assert!(backend.lookup("k").is_none());
        assert_eq!(backend.inspect().size, 0);
    }

    #[test]
    fn warm_does_not_move_hit_or_miss_counters() {
        let backend = InMemoryLruTtlBackend::new(10, Duration::from_secs(60));
        backend.warm(vec![("k".to_string(), b"v".to_vec())]);
        let stats = backend.inspect();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn eviction_on_overflow_keeps_most_recently_used() {
        let backend = InMemoryLruTtlBackend::new(1, Duration::from_secs(60));
        backend.store("a", b"1".to_vec());
        backend.store("b", b"2".to_vec());
        assert!(backend.lookup("a").is_none());
        assert_eq!(backend.lookup("b"), Some(b"2".to_vec()));
        assert_eq!(backend.inspect().evictions, 1);
    }
}
