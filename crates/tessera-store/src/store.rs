//! Revocation store capability and backend selection.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tessera_core::{StoreBackend, StoreConfig};

use crate::error::StoreResult;
use crate::memory::MemoryStore;
use crate::redis_store::RedisStore;

/// Key/hash store with per-key TTLs, as required for token revocation.
///
/// Every operation may fail with [`StoreError::StoreUnavailable`] when the
/// backend cannot be reached. Nothing is retried or cached; failures go
/// straight back to the caller.
///
/// [`StoreError::StoreUnavailable`]: crate::StoreError::StoreUnavailable
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Get a scalar value. Fails with `KeyNotFound` when absent or expired.
    async fn get(&self, key: &str) -> StoreResult<String>;

    /// Set a scalar value, replacing any previous value and TTL.
    ///
    /// A `None` or zero TTL stores the value without expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Set or refresh the TTL of an existing key without touching its value.
    ///
    /// Fails with `KeyNotFound` if the key does not exist. A TTL of zero
    /// minutes expires the key immediately.
    async fn expire(&self, key: &str, minutes: u32) -> StoreResult<()>;

    /// Get one field of a hash. Fails with `KeyNotFound` when the key or the
    /// field is absent.
    async fn hget(&self, key: &str, field: &str) -> StoreResult<String>;

    /// Set one field of a hash, creating the hash if needed.
    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// Get every field of a hash. A missing key yields an empty map.
    async fn hget_all(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// Delete fields from a hash. Missing fields are ignored.
    async fn hdel(&self, key: &str, fields: &[&str]) -> StoreResult<()>;

    /// Close the store. Every later call fails with `Closed`.
    async fn close(&self) -> StoreResult<()>;
}

/// Create a store backend based on configuration.
pub async fn connect(config: &StoreConfig) -> StoreResult<Box<dyn RevocationStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::debug!("Using in-memory revocation store");
            Ok(Box::new(MemoryStore::new()))
        }
        StoreBackend::Redis => Ok(Box::new(RedisStore::connect(config).await?)),
    }
}
