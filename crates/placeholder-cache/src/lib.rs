//! Size-bounded in-memory cache for generated placeholder images
//!
//! Memoizes generated image payloads keyed by a prefix of the prompt text.
//! A periodic sweep bounds the entry count by dropping the earliest-inserted
//! half once the cap is exceeded (arrival order, not recency). Best-effort
//! only: process-local, no durability, last write wins on racing misses.

mod cache;
mod types;

pub use cache::{PlaceholderCache, ERROR_KEY, EVICT_COUNT, KEY_PREFIX_CHARS, MAX_ENTRIES};
pub use types::CacheStats;
