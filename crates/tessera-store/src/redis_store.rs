//! Redis-backed revocation store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;
use std::time::Duration;
use tessera_core::StoreConfig;

use crate::error::{StoreError, StoreResult};
use crate::store::RevocationStore;

/// Revocation store backed by a Redis-compatible server.
///
/// Holds a single [`ConnectionManager`], which multiplexes commands over one
/// connection and reconnects on its own. This type adds no retries on top.
pub struct RedisStore {
    connection: RwLock<Option<ConnectionManager>>,
    command_timeout: Option<Duration>,
    endpoint: String,
}

impl RedisStore {
    /// Connect to the server described by `config`.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.connection_url())
            .map_err(|e| StoreError::Configuration(e.to_string()))?;
        let command_timeout = config.command_timeout();

        let manager = with_timeout(command_timeout, ConnectionManager::new(client)).await?;
        tracing::info!("Connected to revocation store at {}", config.endpoint());

        Ok(Self {
            connection: RwLock::new(Some(manager)),
            command_timeout,
            endpoint: config.endpoint(),
        })
    }

    /// `host:port` of the server.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connection(&self) -> StoreResult<ConnectionManager> {
        let guard = self
            .connection
            .read()
            .map_err(|e| StoreError::Backend(format!("Failed to acquire read lock: {}", e)))?;
        guard.clone().ok_or(StoreError::Closed)
    }

    async fn run<T, F>(&self, command: F) -> StoreResult<T>
    where
        F: Future<Output = RedisResult<T>> + Send,
    {
        with_timeout(self.command_timeout, command).await
    }
}

async fn with_timeout<T, F>(limit: Option<Duration>, command: F) -> StoreResult<T>
where
    F: Future<Output = RedisResult<T>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, command).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                tracing::error!("Revocation store command timed out after {:?}", limit);
                Err(StoreError::StoreUnavailable(format!(
                    "command timed out after {}ms",
                    limit.as_millis()
                )))
            }
        },
        None => command.await.map_err(StoreError::from),
    }
}

/// TTL in whole milliseconds for `PSETEX`, which rejects 0.
///
/// Sub-millisecond TTLs round up to 1 ms instead of failing on the server.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl RevocationStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<String> {
        let mut conn = self.connection()?;
        let value: Option<String> = self.run(conn.get(key)).await?;
        value.ok_or_else(|| {
            tracing::debug!("Revocation store miss for {}", key);
            StoreError::not_found(key)
        })
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.connection()?;
        match ttl.filter(|t| !t.is_zero()) {
            Some(ttl) => {
                self.run::<(), _>(conn.pset_ex(key, value, ttl_millis(ttl)))
                    .await
            }
            None => self.run::<(), _>(conn.set(key, value)).await,
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.connection()?;
        let _removed: i64 = self.run(conn.del(key)).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, minutes: u32) -> StoreResult<()> {
        let mut conn = self.connection()?;
        let seconds = i64::from(minutes) * 60;
        let applied: bool = self.run(conn.expire(key, seconds)).await?;
        if applied {
            Ok(())
        } else {
            Err(StoreError::not_found(key))
        }
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<String> {
        let mut conn = self.connection()?;
        let value: Option<String> = self.run(conn.hget(key, field)).await?;
        value.ok_or_else(|| StoreError::not_found(format!("{key}/{field}")))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.connection()?;
        self.run::<(), _>(conn.hset(key, field, value)).await
    }

    async fn hget_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut conn = self.connection()?;
        self.run(conn.hgetall(key)).await
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> StoreResult<()> {
        // HDEL without fields is a syntax error on the server
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection()?;
        let _removed: i64 = self.run(conn.hdel(key, fields.to_vec())).await?;
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        let mut guard = self
            .connection
            .write()
            .map_err(|e| StoreError::Backend(format!("Failed to acquire write lock: {}", e)))?;
        match guard.take() {
            Some(_) => {
                tracing::info!("Closed revocation store connection to {}", self.endpoint);
                Ok(())
            }
            None => Err(StoreError::Closed),
        }
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("endpoint", &self.endpoint)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}
