//! Cursor cache backends.
//!
//! Deep pagination carries the previous page's sort-key tuple between
//! requests through an external cache. The builder only needs get/set by
//! key; the value is an opaque serialized string.
//!
//! The cursor is best-effort, last-writer-wins — not a transactional
//! checkpoint. Concurrent paginators sharing one cache key race on
//! read/write and may observe a stale cursor; callers needing isolation
//! must scope their keys (see the cursor-prefix configuration).

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod redis;

pub use memory::MemoryCursorCache;
pub use redis::RedisCursorCache;

#[derive(Error, Debug)]
#[error("cursor cache error: {0}")]
pub struct CacheError(pub String);

impl From<CacheError> for crate::error::Error {
    fn from(e: CacheError) -> Self {
        crate::error::Error::Logic {
            code: 0,
            message: e.to_string(),
        }
    }
}

/// Key/value store for pagination cursors.
#[async_trait]
pub trait CursorCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}
