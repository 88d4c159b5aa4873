use async_trait::async_trait;
use dashmap::DashMap;

use super::{CacheError, CursorCache};

/// In-process cursor cache. The default backend when no shared cache is
/// configured; cursors live only as long as the process.
pub struct MemoryCursorCache {
    data: DashMap<String, String>,
}

impl MemoryCursorCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Get current entry count
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.data.clear();
    }
}

impl Default for MemoryCursorCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CursorCache for MemoryCursorCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.data.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_cache_is_empty() {
        let cache = MemoryCursorCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCursorCache::new();
        cache.set("cursor:abc", "[1700000000,42]").await.unwrap();

        let value = cache.get("cursor:abc").await.unwrap();
        assert_eq!(value.as_deref(), Some("[1700000000,42]"));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let cache = MemoryCursorCache::new();
        assert!(cache.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = MemoryCursorCache::new();
        cache.set("k", "old").await.unwrap();
        cache.set("k", "new").await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCursorCache::new();
        for i in 0..5 {
            cache.set(&format!("k{i}"), "v").await.unwrap();
        }
        assert_eq!(cache.len(), 5);

        cache.clear();
        assert!(cache.is_empty());
    }
}
