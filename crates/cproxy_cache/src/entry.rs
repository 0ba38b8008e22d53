use bytes::Bytes;
use http::{HeaderValue, StatusCode};
use tokio::time::{Duration, Instant};

/// A buffered origin response plus the instant it was stored.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
    pub created_at: Instant,
}

impl CacheEntry {
    pub fn new(
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
        created_at: Instant,
    ) -> Self {
        Self {
            status,
            content_type,
            body,
            created_at,
        }
    }

    /// Time elapsed between storage and `now` (zero if `now` is earlier).
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// An entry exactly `ttl` old is still fresh.
    pub fn is_expired_at(&self, now: Instant, ttl: Duration) -> bool {
        self.age_at(now) > ttl
    }
}
