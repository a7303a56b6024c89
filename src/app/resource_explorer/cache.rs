//! Short-lived response cache using Moka.
//!
//! Shared by the resource drilldown endpoints and the cost endpoints so that
//! a dashboard refresh does not shell out to the CLI again within the TTL.
//! Entries older than the TTL read as absent; there is no size bound beyond
//! what the TTL naturally evicts.

use moka::sync::Cache;
use std::time::Duration;

/// Default lifetime of a cached response
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Keyed TTL cache. Clones share the same underlying store.
#[derive(Clone)]
pub struct TtlCache<V: Clone + Send + Sync + 'static> {
    entries: Cache<String, V>,
    ttl: Duration,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        let entries = Cache::builder()
            .time_to_live(ttl)
            .eviction_listener(|key, _value, cause| {
                tracing::trace!("Cache evicted '{}': {:?}", key, cause);
            })
            .build();

        Self { entries, ttl }
    }

    /// Cached value for `key`, if present and not expired
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.entries.get(key);
        if value.is_some() {
            tracing::debug!("Cache hit '{}'", key);
        } else {
            tracing::debug!("Cache miss '{}'", key);
        }
        value
    }

    /// Insert or overwrite, restarting the entry's TTL
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
        tracing::info!("Cache cleared");
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Approximate number of live entries (for logging)
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + Send + Sync + 'static> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache: TtlCache<Vec<String>> = TtlCache::new(Duration::from_secs(60));
        cache.set("system|ec2|all", vec!["i-1".to_string()]);

        assert_eq!(cache.get("system|ec2|all"), Some(vec!["i-1".to_string()]));
        assert_eq!(cache.get("system|vpc|all"), None);
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_set_overwrites() {
        let cache: TtlCache<u32> = TtlCache::default();
        cache.set("k", 1);
        cache.set("k", 2);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(50));
        cache.set("k", 7);
        assert_eq!(cache.get("k"), Some(7));

        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_cache_clear() {
        let cache: TtlCache<u32> = TtlCache::default();
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache: TtlCache<u32> = TtlCache::default();
        let other = cache.clone();
        other.set("shared", 3);
        assert_eq!(cache.get("shared"), Some(3));
    }
}
