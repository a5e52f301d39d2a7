//! Display-name cache to avoid repeated name lookups

use crate::source::DataSource;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Thread-safe, time-bounded cache of security display names
#[derive(Clone)]
pub struct NameCache {
    cache: Arc<RwLock<TimedCache<String, String>>>,
}

impl NameCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a cached name
    pub async fn get(&self, symbol: &str) -> Option<String> {
        let mut cache = self.cache.write().await;
        cache.cache_get(symbol).cloned()
    }

    /// Insert a name into the cache
    pub async fn insert(&self, symbol: impl Into<String>, name: impl Into<String>) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(symbol.into(), name.into());
    }

    /// Name for `symbol`, looked up through `source` on a miss
    ///
    /// Never fails: an unknown or failed lookup yields the symbol itself.
    /// Failed lookups are not cached.
    pub async fn resolve(&self, source: &dyn DataSource, symbol: &str) -> String {
        if let Some(name) = self.get(symbol).await {
            debug!(symbol, "Name cache hit");
            return name;
        }

        let name = match source.display_name(symbol).await {
            Ok(Some(name)) => name,
            Ok(None) => symbol.to_string(),
            Err(e) => {
                warn!(symbol, error = %e, "Display name lookup failed, using symbol");
                return symbol.to_string();
            }
        };

        self.insert(symbol, name.clone()).await;
        name
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockDataSource;
    use finagent_core::Error;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = NameCache::new(Duration::from_secs(60));
        cache.insert("600519", "贵州茅台").await;
        assert_eq!(cache.get("600519").await.as_deref(), Some("贵州茅台"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_resolve_looks_up_once() {
        let mut source = MockDataSource::new();
        source
            .expect_display_name()
            .times(1)
            .returning(|_| Ok(Some("贵州茅台".to_string())));

        let cache = NameCache::new(Duration::from_secs(60));
        assert_eq!(cache.resolve(&source, "600519").await, "贵州茅台");
        assert_eq!(cache.resolve(&source, "600519").await, "贵州茅台");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_symbol() {
        let mut source = MockDataSource::new();
        source
            .expect_display_name()
            .times(2)
            .returning(|_| Err(Error::Network("timeout".to_string())));

        let cache = NameCache::new(Duration::from_secs(60));
        assert_eq!(cache.resolve(&source, "600519").await, "600519");
        assert_eq!(cache.resolve(&source, "600519").await, "600519");
        assert!(cache.is_empty().await);
    }
}
