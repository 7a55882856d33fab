use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::{CacheBackend, CacheStats};

/// The seam a `remote_keyvalue` backend is built from. No concrete
/// HTTP/Redis/etc. client ships in the core (external stores are out of
/// scope per §1); an embedding application implements this trait and hands
/// it to [`RemoteBackend::new`].
pub trait RemoteCacheClient: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String>;
    fn put(&self, key: &str, payload: &[u8]) -> Result<(), String>;
    fn clear(&self) -> Result<(), String>;
}

/// Wraps a [`RemoteCacheClient`] to satisfy [`CacheBackend`]: every client
/// error is logged and degraded to a miss, never surfaced, matching the
/// `null`/`in_memory_lru_ttl` backends' observable contract exactly.
pub struct RemoteBackend<C: RemoteCacheClient> {
    client: C,
    size_hint: Mutex<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<C: RemoteCacheClient> RemoteBackend<C> {
    pub fn new(client: C) -> Self {
        RemoteBackend {
            client,
            size_hint: Mutex::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<C: RemoteCacheClient> CacheBackend for RemoteBackend<C> {
    fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        match self.client.get(key) {
            Ok(Some(payload)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(payload)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote cache lookup failed, degrading to miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn store(&self, key: &str, payload: Vec<u8>) {
        if let Err(err) = self.client.put(key, &payload) {
            tracing::warn!(error = %err, "remote cache store failed, discarding silently");
            return;
        }
        let mut hint = self.size_hint.lock().unwrap_or_else(|e| e.into_inner());
        *hint += 1;
    }

    fn inspect(&self) -> CacheStats {
        CacheStats {
            size: *self.size_hint.lock().unwrap_or_else(|e| e.into_inner()),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: 0,
        }
    }

    fn clear(&self) {
        if let Err(err) = self.client.clear() {
            tracing::warn!(error = %err, "remote cache clear failed");
            return;
        }
        *self.size_hint.lock().unwrap_or_else(|e| e.into_inner()) = 0;
    }

    fn warm(&self, pairs: Vec<(String, Vec<u8>)>) {
        for (key, payload) in pairs {
            let _ = self.client.put(&key, &payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct FlakyClient {
        store: StdMutex<HashMap<String, Vec<u8>>>,
        fail_next_get: std::sync::atomic::AtomicBool,
    }

    impl RemoteCacheClient for FlakyClient {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String> {
            if self.fail_next_get.swap(false, Ordering::SeqCst) {
                return Err("simulated transient failure".to_string());
            }
            Ok(self.store.lock().unwrap().get(key).cloned())
        }

        fn put(&self, key: &str, payload: &[u8]) -> Result<(), String> {
            self.store
                .lock()
                .unwrap()
                .insert(key.to_string(), payload.to_vec());
            Ok(())
        }

        fn clear(&self) -> Result<(), String> {
            self.store.lock().unwrap().clear();
            Ok(())
        }
    }

    #[test]
    fn a_backend_error_degrades_to_a_miss_not_a_panic() {
        let backend = RemoteBackend::new(FlakyClient {
            store: StdMutex::new(HashMap::new()),
            fail_next_get: std::sync::atomic::AtomicBool::new(true),
        });
        backend.store("k", b"v".to_vec());
        assert!(backend.lookup("k").is_none());
        assert!(backend.lookup("k").is_some());
    }
}
