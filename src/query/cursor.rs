//! Deep-pagination cursor protocol.
//!
//! Offset pagination degrades as the offset grows; deep pagination instead
//! replays the previous page's sort-key tuple as `search_after`. The tuple
//! is carried between requests through the cursor cache:
//!
//! ```text
//! page(n, deep)                          page(n+1, deep)
//!     │                                      │
//!     ├─ run search ──▶ hits                 ├─ cache.get(key) ─▶ search_after
//!     └─ cache.set(key, last hit's sort)     └─ run search from there
//! ```
//!
//! The key is derived from the serialized query, the index name and the
//! page size, so two different queries (or sizes) never share a cursor.
//! An empty page writes nothing: the cursor only ever advances on hits.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cache::CursorCache;
use crate::error::{Error, Result};

/// Cache key for one query's cursor: `{prefix}:{digest}` over the wire
/// query, the index name and the page size.
pub(crate) fn cache_key(prefix: &str, query: &Value, index: &str, size: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.to_string().as_bytes());
    hasher.update(index.as_bytes());
    hasher.update(size.to_string().as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    format!("{prefix}:{hex}")
}

/// Load the previous page's sort tuple, if any. Unreadable entries are
/// discarded rather than surfaced.
pub(crate) async fn load(cache: &dyn CursorCache, key: &str) -> Result<Option<Vec<Value>>> {
    let Some(raw) = cache.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<Vec<Value>>(&raw) {
        Ok(sorted) if !sorted.is_empty() => Ok(Some(sorted)),
        _ => {
            debug!(key, "discarding unreadable cursor entry");
            Ok(None)
        }
    }
}

/// Persist the sort tuple of a page's last hit.
pub(crate) async fn store(cache: &dyn CursorCache, key: &str, sorted: &[Value]) -> Result<()> {
    let raw = serde_json::to_string(sorted)
        .map_err(|e| Error::logic(0, format!("cannot serialize cursor: {e}")))?;
    debug!(key, cursor = %raw, "advancing pagination cursor");
    cache.set(key, &raw).await?;
    Ok(())
}
