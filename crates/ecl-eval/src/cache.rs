//! Memoization of compiled queries.
//!
//! Evaluating the same constraint against an unchanged graph is
//! referentially transparent, so compiled queries can be reused. The cache
//! is an LRU map with TTL expiry, keyed by the canonical rendering of the
//! constraint plus the hierarchy form it was compiled for. Rendering is
//! the key rather than the AST value so that structurally equal
//! constraints share an entry regardless of how they were produced.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::query::Query;
use crate::reader::Form;

/// Configuration for the evaluation cache.
#[derive(Debug, Clone)]
pub struct EvalCacheConfig {
    /// Maximum number of cached compiled queries.
    pub max_entries: usize,
    /// Time-to-live for cache entries.
    pub ttl: Duration,
}

impl Default for EvalCacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000, ttl: Duration::from_secs(300) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    form: Form,
    ecl: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    query: Query,
    created_at: Instant,
}

impl CacheEntry {
    fn new(query: Query) -> Self {
        Self { query, created_at: Instant::now() }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Thread-safe LRU cache with TTL expiry for compiled queries.
pub struct EvalCache {
    inner: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl EvalCache {
    /// Creates a cache with the given configuration. A zero capacity is
    /// clamped to one entry.
    pub fn new(config: EvalCacheConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self { inner: Mutex::new(LruCache::new(capacity)), ttl: config.ttl }
    }

    /// Looks up the compiled query for a rendered constraint. Expired
    /// entries are dropped on access. A hit promotes the entry to
    /// most-recently-used.
    pub fn get(&self, form: Form, ecl: &str) -> Option<Query> {
        let key = CacheKey { form, ecl: ecl.to_string() };
        let mut cache = self.inner.lock();
        if let Some(entry) = cache.get(&key) {
            if entry.is_expired(self.ttl) {
                cache.pop(&key);
                return None;
            }
            return Some(entry.query.clone());
        }
        None
    }

    /// Stores a compiled query, evicting the least recently used entry
    /// when full.
    pub fn put(&self, form: Form, ecl: String, query: Query) {
        let key = CacheKey { form, ecl };
        self.inner.lock().put(key, CacheEntry::new(query));
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl std::fmt::Debug for EvalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn cache_with(max_entries: usize, ttl: Duration) -> EvalCache {
        EvalCache::new(EvalCacheConfig { max_entries, ttl })
    }

    #[test]
    fn test_put_and_get() {
        let cache = cache_with(10, Duration::from_secs(60));
        cache.put(Form::Inferred, "<< 100".to_string(), Query::MatchAll);

        assert_eq!(cache.get(Form::Inferred, "<< 100"), Some(Query::MatchAll));
        assert_eq!(cache.get(Form::Inferred, "<< 200"), None);
    }

    #[test]
    fn test_form_is_part_of_the_key() {
        let cache = cache_with(10, Duration::from_secs(60));
        cache.put(Form::Inferred, "<< 100".to_string(), Query::MatchAll);

        assert!(cache.get(Form::Stated, "<< 100").is_none());
        assert!(cache.get(Form::Inferred, "<< 100").is_some());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = cache_with(2, Duration::from_secs(60));
        cache.put(Form::Inferred, "a".to_string(), Query::MatchAll);
        cache.put(Form::Inferred, "b".to_string(), Query::MatchNone);

        // Touch "a" so "b" becomes the eviction victim.
        let _ = cache.get(Form::Inferred, "a");
        cache.put(Form::Inferred, "c".to_string(), Query::MatchAll);

        assert!(cache.get(Form::Inferred, "a").is_some());
        assert!(cache.get(Form::Inferred, "b").is_none());
        assert!(cache.get(Form::Inferred, "c").is_some());
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = cache_with(10, Duration::from_millis(30));
        cache.put(Form::Inferred, "a".to_string(), Query::MatchAll);
        assert!(cache.get(Form::Inferred, "a").is_some());

        thread::sleep(Duration::from_millis(60));
        assert!(cache.get(Form::Inferred, "a").is_none());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = cache_with(0, Duration::from_secs(60));
        cache.put(Form::Inferred, "a".to_string(), Query::MatchAll);
        cache.put(Form::Inferred, "b".to_string(), Query::MatchNone);

        assert_eq!(cache.len(), 1);
        assert!(cache.get(Form::Inferred, "b").is_some());
    }

    #[test]
    fn test_clear() {
        let cache = cache_with(10, Duration::from_secs(60));
        cache.put(Form::Inferred, "a".to_string(), Query::MatchAll);
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
    }
}
