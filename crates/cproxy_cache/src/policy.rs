use tokio::time::{Duration, Instant};

use crate::entry::CacheEntry;

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    ttl: Duration,
}

impl CachePolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn from_secs(ttl_secs: u64) -> Self {
        Self::new(Duration::from_secs(ttl_secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        !entry.is_expired_at(now, self.ttl)
    }
}
