use dashmap::DashMap;

use crate::entry::CacheEntry;
use crate::key::CacheKey;

/// Concurrent path -> entry map.
///
/// `get` and `put` are individually atomic; nothing here guards a
/// fetch-then-put sequence built on top of them.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    inner: DashMap<CacheKey, CacheEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.inner.get(key).map(|e| e.value().clone())
    }

    /// Unconditional upsert. Last writer wins.
    pub fn put(&self, key: CacheKey, entry: CacheEntry) {
        self.inner.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use http::StatusCode;
    use tokio::time::Instant;

    use super::*;

    fn entry(body: &'static [u8]) -> CacheEntry {
        CacheEntry::new(StatusCode::OK, None, Bytes::from_static(body), Instant::now())
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let store = MemoryCacheStore::new();
        store.put(CacheKey::new("/foo"), entry(b"bar"));
        store.put(CacheKey::new("/foo"), entry(b"baz"));

        assert_eq!(store.len(), 1);
        let got = store.get(&CacheKey::new("/foo")).expect("expected entry");
        assert_eq!(got.body, Bytes::from_static(b"baz"));
    }

    #[test]
    fn keys_are_exact_and_case_sensitive() {
        let store = MemoryCacheStore::new();
        store.put(CacheKey::new("/a"), entry(b"a-body"));

        assert!(store.get(&CacheKey::new("/b")).is_none());
        assert!(store.get(&CacheKey::new("/A")).is_none());
        assert!(store.get(&CacheKey::new("/a/")).is_none());
    }

    #[test]
    fn concurrent_puts_leave_a_single_entry_per_key() {
        let store = Arc::new(MemoryCacheStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let body = Bytes::from(format!("body-{i}"));
                    store.put(
                        CacheKey::new("/race"),
                        CacheEntry::new(StatusCode::OK, None, body, Instant::now()),
                    );
                })
            })
            .collect();
        for h in handles {
            h.join().expect("writer thread panicked");
        }

        assert_eq!(store.len(), 1);
        let got = store.get(&CacheKey::new("/race")).expect("expected entry");
        assert!(got.body.starts_with(b"body-"));
    }
}
