//! Connection bundle.
//!
//! The builder's collaborators — wire client, cursor cache, cursor key
//! prefix — are passed explicitly; there is no process-wide registry.
//! A [`Connection`] is the one handle callers thread through model code.

use std::sync::Arc;

use crate::cache::{CursorCache, MemoryCursorCache};
use crate::client::{ClientFactory, SearchClient};
use crate::config::ElasticConfig;
use crate::error::Result;

/// Explicit bundle of the collaborators a query needs. Cheap to clone;
/// clones share the underlying client and cache.
#[derive(Clone)]
pub struct Connection {
    client: Arc<dyn SearchClient>,
    cursor_cache: Arc<dyn CursorCache>,
    cursor_prefix: String,
}

impl Connection {
    #[must_use]
    pub fn new(
        client: Arc<dyn SearchClient>,
        cursor_cache: Arc<dyn CursorCache>,
        cursor_prefix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            cursor_cache,
            cursor_prefix: cursor_prefix.into(),
        }
    }

    /// Build from configuration: an HTTP client for the named connection
    /// group and an in-process cursor cache. Swap in a shared cache with
    /// [`with_cursor_cache`](Self::with_cursor_cache) when several
    /// processes paginate the same queries.
    pub fn from_config(config: &ElasticConfig, group: &str) -> Result<Self> {
        let client = ClientFactory::new(config.clone()).create(group)?;
        Ok(Self::new(
            Arc::new(client),
            Arc::new(MemoryCursorCache::new()),
            config.cursor_prefix.clone(),
        ))
    }

    #[must_use]
    pub fn with_cursor_cache(mut self, cache: Arc<dyn CursorCache>) -> Self {
        self.cursor_cache = cache;
        self
    }

    pub(crate) fn client(&self) -> &dyn SearchClient {
        self.client.as_ref()
    }

    pub(crate) fn cursor_cache(&self) -> &dyn CursorCache {
        self.cursor_cache.as_ref()
    }

    pub(crate) fn cursor_prefix(&self) -> &str {
        &self.cursor_prefix
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("cursor_prefix", &self.cursor_prefix)
            .finish_non_exhaustive()
    }
}
