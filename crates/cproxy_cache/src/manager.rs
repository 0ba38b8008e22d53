use tokio::time::Instant;
use tracing::debug;

use crate::{entry::CacheEntry, key::CacheKey, policy::CachePolicy, store::MemoryCacheStore};

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum CacheLookup {
    Fresh(CacheEntry),
    /// Present but older than the TTL. Kept in the store until overwritten.
    Stale(CacheEntry),
    Absent,
}

impl CacheLookup {
    pub fn fresh(self) -> Option<CacheEntry> {
        match self {
            CacheLookup::Fresh(entry) => Some(entry),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CacheManager {
    store: MemoryCacheStore,
    policy: CachePolicy,
}

impl CacheManager {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            store: MemoryCacheStore::new(),
            policy,
        }
    }

    pub fn lookup(&self, path: &str, now: Instant) -> CacheLookup {
        let key = CacheKey::new(path);
        let Some(entry) = self.store.get(&key) else {
            return CacheLookup::Absent;
        };

        if self.policy.is_fresh(&entry, now) {
            CacheLookup::Fresh(entry)
        } else {
            debug!(
                target: "cproxy::cache",
                cache_key = %key,
                age_secs = entry.age_at(now).as_secs(),
                ttl_secs = self.policy.ttl().as_secs(),
                "Cached entry expired"
            );
            CacheLookup::Stale(entry)
        }
    }

    pub fn store(&self, path: &str, entry: CacheEntry) {
        let key = CacheKey::new(path);
        debug!(
            target: "cproxy::cache",
            cache_key = %key,
            status = entry.status.as_u16(),
            body_len = entry.body.len(),
            "Storing cache entry"
        );
        self.store.put(key, entry);
    }

    /// Raw read that ignores freshness.
    pub fn peek(&self, path: &str) -> Option<CacheEntry> {
        self.store.get(&CacheKey::new(path))
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
