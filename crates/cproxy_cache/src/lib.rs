//! In-memory response cache keyed by request path.
//!
//! Entries are never evicted: expiry is evaluated lazily on lookup and a
//! stale entry stays in the map until the next successful fetch for the same
//! path overwrites it.

mod entry;
mod key;
mod manager;
mod policy;
mod store;

pub use entry::CacheEntry;
pub use key::CacheKey;
pub use manager::{CacheLookup, CacheManager};
pub use policy::CachePolicy;
pub use store::MemoryCacheStore;
