use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

use crate::types::CacheStats;

/// Entry cap checked by the sweep.
pub const MAX_ENTRIES: usize = 100;

/// How many of the earliest-inserted entries a sweep removes once over cap.
pub const EVICT_COUNT: usize = 50;

/// How many leading characters of the prompt form the cache key.
pub const KEY_PREFIX_CHARS: usize = 50;

/// Fixed key under which the error placeholder is memoized.
pub const ERROR_KEY: &str = "__placeholder_error__";

struct Inner {
    entries: HashMap<String, String>,
    /// Keys in arrival order. Overwrites keep the original position, so
    /// eviction is by first insertion, not recency.
    order: VecDeque<String>,
    stats: CacheStats,
}

/// In-memory memoization cache for placeholder image payloads.
///
/// The lock guards plain map operations; miss computation runs outside it,
/// so two concurrent misses for one key may both compute and the second
/// write wins.
pub struct PlaceholderCache {
    inner: Mutex<Inner>,
}

impl PlaceholderCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Derive the cache key from prompt text: its first [`KEY_PREFIX_CHARS`]
    /// characters. Distinct prompts sharing a long common prefix therefore
    /// share an entry; that collision is accepted, not handled.
    pub fn cache_key(prompt: &str) -> String {
        prompt.chars().take(KEY_PREFIX_CHARS).collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock().expect("placeholder cache lock poisoned");
        match inner.entries.get(key).cloned() {
            Some(value) => {
                inner.stats.hits += 1;
                Some(value)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a value, overwriting any existing one. A fresh key joins the
    /// back of the arrival queue; an overwrite keeps its original slot.
    pub fn insert(&self, key: impl Into<String>, value: String) {
        let key = key.into();
        let mut inner = self.inner.lock().expect("placeholder cache lock poisoned");
        if inner.entries.insert(key.clone(), value).is_none() {
            inner.order.push_back(key);
        }
        inner.stats.entries = inner.entries.len();
    }

    /// Return the cached value for `key`, or compute, store, and return one.
    ///
    /// The closure runs without the lock held. If another writer lands in
    /// between, the later insert wins and its value is returned.
    pub fn get_or_insert_with(&self, key: &str, compute: impl FnOnce() -> String) -> String {
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("placeholder cache lock poisoned")
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run one eviction pass: if over [`MAX_ENTRIES`], remove the
    /// [`EVICT_COUNT`] earliest-inserted entries. Returns how many were
    /// removed.
    pub fn sweep(&self) -> usize {
        let mut inner = self.inner.lock().expect("placeholder cache lock poisoned");
        if inner.entries.len() <= MAX_ENTRIES {
            return 0;
        }

        let mut evicted = 0;
        while evicted < EVICT_COUNT {
            let Some(key) = inner.order.pop_front() else {
                break;
            };
            if inner.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }

        inner.stats.evictions += evicted as u64;
        inner.stats.entries = inner.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = inner.entries.len(), "Placeholder cache sweep");
        }
        evicted
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("placeholder cache lock poisoned");
        let mut stats = inner.stats.clone();
        stats.entries = inner.entries.len();
        stats
    }
}

impl Default for PlaceholderCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let cache = PlaceholderCache::new();
        assert!(cache.get("k").is_none());

        cache.insert("k", "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_get_or_insert_with_memoizes() {
        let cache = PlaceholderCache::new();
        let first = cache.get_or_insert_with("k", || "computed-1".to_string());
        assert_eq!(first, "computed-1");

        // Second call must not recompute
        let second = cache.get_or_insert_with("k", || "computed-2".to_string());
        assert_eq!(second, "computed-1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_twice_last_write_wins() {
        let cache = PlaceholderCache::new();
        cache.insert("k", "old".to_string());
        cache.insert("k", "new".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_key_truncates_to_50_chars() {
        let long = "x".repeat(120);
        assert_eq!(PlaceholderCache::cache_key(&long).chars().count(), 50);

        let short = "short prompt";
        assert_eq!(PlaceholderCache::cache_key(short), short);
    }

    #[test]
    fn test_cache_key_collision_on_shared_prefix() {
        let prefix = "a".repeat(50);
        let a = format!("{prefix} sunset over the bay");
        let b = format!("{prefix} a red bicycle");
        // Known limitation: prompts sharing a 50-char prefix share a key
        assert_eq!(
            PlaceholderCache::cache_key(&a),
            PlaceholderCache::cache_key(&b)
        );
    }

    #[test]
    fn test_sweep_noop_at_or_under_cap() {
        let cache = PlaceholderCache::new();
        for i in 0..MAX_ENTRIES {
            cache.insert(format!("k{i}"), format!("v{i}"));
        }
        assert_eq!(cache.sweep(), 0);
        assert_eq!(cache.len(), MAX_ENTRIES);
    }

    #[test]
    fn test_sweep_evicts_earliest_inserted() {
        let cache = PlaceholderCache::new();
        for i in 0..101 {
            cache.insert(format!("k{i}"), format!("v{i}"));
        }

        assert_eq!(cache.sweep(), EVICT_COUNT);
        assert_eq!(cache.len(), 101 - EVICT_COUNT);

        // The 50 earliest-inserted keys are gone
        for i in 0..EVICT_COUNT {
            assert!(cache.get(&format!("k{i}")).is_none(), "k{i} should be evicted");
        }
        // Everything inserted after them is still retrievable
        for i in EVICT_COUNT..101 {
            assert!(cache.get(&format!("k{i}")).is_some(), "k{i} should remain");
        }
        assert_eq!(cache.stats().evictions, EVICT_COUNT as u64);
    }

    #[test]
    fn test_overwrite_keeps_arrival_position() {
        let cache = PlaceholderCache::new();
        for i in 0..101 {
            cache.insert(format!("k{i}"), format!("v{i}"));
        }
        // Rewriting k0 must not move it to the back of the queue
        cache.insert("k0", "rewritten".to_string());

        cache.sweep();
        assert!(cache.get("k0").is_none());
    }

    #[test]
    fn test_error_sentinel_key_is_cacheable() {
        let cache = PlaceholderCache::new();
        cache.insert(ERROR_KEY, "error image".to_string());
        assert_eq!(cache.get(ERROR_KEY).as_deref(), Some("error image"));
    }
}
