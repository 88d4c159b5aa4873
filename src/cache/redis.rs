// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Redis cursor cache backend.
//!
//! The shared backend for deployments where several processes paginate the
//! same queries. Keys can be namespaced with a prefix when the Redis
//! instance is shared with other applications.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use super::{CacheError, CursorCache};

pub struct RedisCursorCache {
    connection: ConnectionManager,
    /// Optional key prefix for namespacing (e.g., "myapp:" → "myapp:cursor:…")
    prefix: String,
}

impl RedisCursorCache {
    /// Connect without a key prefix.
    pub async fn new(connection_string: &str) -> Result<Self, CacheError> {
        Self::with_prefix(connection_string, None).await
    }

    /// Connect with an optional key prefix.
    pub async fn with_prefix(
        connection_string: &str,
        prefix: Option<&str>,
    ) -> Result<Self, CacheError> {
        let client = Client::open(connection_string).map_err(|e| CacheError(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError(e.to_string()))?;

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
        })
    }

    /// Apply the prefix to a key.
    #[inline]
    fn prefixed_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }
}

#[async_trait]
impl CursorCache for RedisCursorCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn
            .get(self.prefixed_key(key))
            .await
            .map_err(|e| CacheError(e.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .set(self.prefixed_key(key), value)
            .await
            .map_err(|e| CacheError(e.to_string()))?;
        Ok(())
    }
}
