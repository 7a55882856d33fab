//! # orc-cache
//!
//! Deterministic cache for memoizing expensive planning/code-generation
//! calls. Caching is strictly best-effort: every failure mode degrades to a
//! miss rather than surfacing an error to the caller (§4.1, §7 `cache_error`).
//!
//! ## Modules
//!
//! - [`key`] — stable fingerprint construction
//! - [`backend`] — the `CacheBackend` trait plus the `null` and
//!   `in_memory_lru_ttl` implementations
//! - [`remote`] — the pluggable `RemoteCacheClient` seam for a
//!   `remote_keyvalue` backend

mod backend;
mod key;
mod remote;

pub use backend::{CacheBackend, CacheStats, InMemoryLruTtlBackend, NullBackend};
pub use key::CacheKeyInput;
pub use remote::{RemoteBackend, RemoteCacheClient};

use std::sync::Arc;
use std::time::Duration;

/// The cache facade every caller (the orchestrator's C1 integration) holds.
/// Wraps one of the backend variants behind a trait object so switching
/// backends never changes observable `lookup`/`store` semantics.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Cache { backend }
    }

    /// `null` backend: caching disabled entirely.
    pub fn disabled() -> Self {
        Cache::new(Arc::new(NullBackend))
    }

    /// `in_memory_lru_ttl` backend with the given capacity and TTL.
    pub fn in_memory(max_entries: usize, ttl: Duration) -> Self {
        Cache::new(Arc::new(InMemoryLruTtlBackend::new(max_entries, ttl)))
    }

    /// `remote_keyvalue` backend over a caller-supplied client.
    pub fn remote<C: RemoteCacheClient + 'static>(client: C) -> Self {
        Cache::new(Arc::new(RemoteBackend::new(client)))
    }

    pub fn lookup(&self, key: &str) -> (Option<Vec<u8>>, bool) {
        match self.backend.lookup(key) {
            Some(payload) => (Some(payload), true),
            None => (None, false),
        }
    }

    pub fn store(&self, key: &str, payload: Vec<u8>) {
        self.backend.store(key, payload);
    }

    pub fn inspect(&self) -> CacheStats {
        self.backend.inspect()
    }

    pub fn clear(&self) {
        self.backend.clear();
    }

    /// Bulk load without changing hit/miss counters.
    pub fn warm(&self, pairs: Vec<(String, Vec<u8>)>) {
        self.backend.warm(pairs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_lookup_within_ttl_is_a_hit() {
        let cache = Cache::in_memory(10, Duration::from_secs(60));
        cache.store("k1", b"payload".to_vec());
        let (payload, hit) = cache.lookup("k1");
        assert!(hit);
        assert_eq!(payload.unwrap(), b"payload".to_vec());
    }

    #[test]
    fn disabled_cache_always_misses() {
        let cache = Cache::disabled();
        cache.store("k1", b"payload".to_vec());
        let (_, hit) = cache.lookup("k1");
        assert!(!hit);
    }

    #[test]
    fn lru_evicts_oldest_on_overflow() {
        let cache = Cache::in_memory(2, Duration::from_secs(60));
        cache.store("a", b"1".to_vec());
        cache.store("b", b"2".to_vec());
        cache.store("c", b"3".to_vec());
        let (_, hit_a) = cache.lookup("a");
        assert!(!hit_a, "first-inserted key should have been evicted");
        let stats = cache.inspect();
        assert_eq!(stats.evictions, 1);
    }
}
