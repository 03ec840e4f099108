//! In-process revocation store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{StoreError, StoreResult};
use crate::store::RevocationStore;

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone)]
enum Value {
    Scalar(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    next_sweep: Option<Instant>,
}

impl State {
    /// Drop every expired key, at most once per [`SWEEP_INTERVAL`].
    fn sweep(&mut self, now: Instant) {
        if self.next_sweep.is_some_and(|at| now < at) {
            return;
        }
        self.entries.retain(|_, e| e.is_live(now));
        self.next_sweep = Some(now + SWEEP_INTERVAL);
    }
}

const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Revocation store kept in a process-local map.
///
/// Follows Redis semantics for the operations it supports: `set` clears any
/// TTL, `expire 0` removes the key, removing the last hash field removes the
/// key, and mixing scalar and hash operations on one key is an error. Expiry
/// uses the tokio clock, so paused-time tests can advance past TTLs.
///
/// Expired keys are invisible to reads at once and are reclaimed by writes,
/// which sweep the whole map at most once per second.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> StoreResult<usize> {
        let state = self
            .state
            .read()
            .map_err(|e| StoreError::Backend(format!("Failed to acquire read lock: {}", e)))?;
        let now = Instant::now();
        Ok(state.entries.values().filter(|e| e.is_live(now)).count())
    }

    /// Whether the store holds no live keys.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn read<T>(&self, key: &str, f: impl FnOnce(Option<&Value>) -> StoreResult<T>) -> StoreResult<T> {
        self.ensure_open()?;
        let state = self
            .state
            .read()
            .map_err(|e| StoreError::Backend(format!("Failed to acquire read lock: {}", e)))?;
        let now = Instant::now();
        f(state.entries.get(key).filter(|e| e.is_live(now)).map(|e| &e.value))
    }

    fn write<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HashMap<String, Entry>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.ensure_open()?;
        let mut state = self
            .state
            .write()
            .map_err(|e| StoreError::Backend(format!("Failed to acquire write lock: {}", e)))?;
        let now = Instant::now();
        state.sweep(now);
        if state.entries.get(key).is_some_and(|e| !e.is_live(now)) {
            state.entries.remove(key);
        }
        f(&mut state.entries)
    }
}

#[async_trait]
impl RevocationStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<String> {
        self.read(key, |value| match value {
            Some(Value::Scalar(v)) => Ok(v.clone()),
            Some(Value::Hash(_)) => Err(StoreError::Backend(WRONG_TYPE.to_string())),
            None => Err(StoreError::not_found(key)),
        })
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let expires_at = ttl.filter(|t| !t.is_zero()).map(|t| Instant::now() + t);
        self.write(key, |entries| {
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Scalar(value.to_string()),
                    expires_at,
                },
            );
            Ok(())
        })
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.write(key, |entries| {
            entries.remove(key);
            Ok(())
        })
    }

    async fn expire(&self, key: &str, minutes: u32) -> StoreResult<()> {
        self.write(key, |entries| {
            if minutes == 0 {
                return match entries.remove(key) {
                    Some(_) => Ok(()),
                    None => Err(StoreError::not_found(key)),
                };
            }
            let entry = entries
                .get_mut(key)
                .ok_or_else(|| StoreError::not_found(key))?;
            entry.expires_at = Some(Instant::now() + Duration::from_secs(u64::from(minutes) * 60));
            Ok(())
        })
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<String> {
        self.read(key, |value| match value {
            Some(Value::Hash(fields)) => fields
                .get(field)
                .cloned()
                .ok_or_else(|| StoreError::not_found(format!("{key}/{field}"))),
            Some(Value::Scalar(_)) => Err(StoreError::Backend(WRONG_TYPE.to_string())),
            None => Err(StoreError::not_found(key)),
        })
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.write(key, |entries| {
            let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
                value: Value::Hash(HashMap::new()),
                expires_at: None,
            });
            match &mut entry.value {
                Value::Hash(fields) => {
                    fields.insert(field.to_string(), value.to_string());
                    Ok(())
                }
                Value::Scalar(_) => Err(StoreError::Backend(WRONG_TYPE.to_string())),
            }
        })
    }

    async fn hget_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        self.read(key, |value| match value {
            Some(Value::Hash(fields)) => Ok(fields.clone()),
            Some(Value::Scalar(_)) => Err(StoreError::Backend(WRONG_TYPE.to_string())),
            None => Ok(HashMap::new()),
        })
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> StoreResult<()> {
        self.write(key, |entries| {
            let now_empty = match entries.get_mut(key).map(|e| &mut e.value) {
                Some(Value::Hash(existing)) => {
                    for field in fields {
                        existing.remove(*field);
                    }
                    existing.is_empty()
                }
                Some(Value::Scalar(_)) => {
                    return Err(StoreError::Backend(WRONG_TYPE.to_string()));
                }
                None => false,
            };
            if now_empty {
                entries.remove(key);
            }
            Ok(())
        })
    }

    async fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Closed);
        }
        if let Ok(mut state) = self.state.write() {
            state.entries.clear();
        }
        tracing::debug!("In-memory revocation store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryStore::new();
        let err = store.get("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::KeyNotFound { ref key } if key == "missing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_with_ttl_expires() {
        let store = MemoryStore::new();
        store
            .set("k", "v", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("k").await.unwrap(), "v");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("k").await.unwrap_err().is_not_found());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_means_no_expiry() {
        let store = MemoryStore::new();
        store.set("k", "v", Some(Duration::ZERO)).await.unwrap();
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(store.get("k").await.unwrap(), "v");
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_clears_previous_ttl() {
        let store = MemoryStore::new();
        store
            .set("k", "old", Some(Duration::from_secs(10)))
            .await
            .unwrap();
        store.set("k", "new", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(store.get("k").await.unwrap(), "new");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_existing_key() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        store.expire("k", 1).await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(store.get("k").await.unwrap(), "v");

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(store.get("k").await.unwrap_err().is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_refreshes_ttl() {
        let store = MemoryStore::new();
        store
            .set("k", "v", Some(Duration::from_secs(30)))
            .await
            .unwrap();
        store.expire("k", 2).await.unwrap();

        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(store.get("k").await.unwrap(), "v");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_missing_or_expired_key() {
        let store = MemoryStore::new();
        assert!(store.expire("missing", 5).await.unwrap_err().is_not_found());

        store
            .set("k", "v", Some(Duration::from_secs(1)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.expire("k", 5).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_expire_zero_removes_key() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        store.expire("k", 0).await.unwrap();
        assert!(store.get("k").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert!(store.get("k").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_hash_round_trip() {
        let store = MemoryStore::new();
        store.hset("session", "laptop", "tok-1").await.unwrap();
        store.hset("session", "phone", "tok-2").await.unwrap();
        store.hset("session", "phone", "tok-3").await.unwrap();

        assert_eq!(store.hget("session", "phone").await.unwrap(), "tok-3");

        let all = store.hget_all("session").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["laptop"], "tok-1");
        assert_eq!(all["phone"], "tok-3");
    }

    #[tokio::test]
    async fn test_hash_missing_key_and_field() {
        let store = MemoryStore::new();
        assert!(store.hget("nope", "f").await.unwrap_err().is_not_found());
        assert!(store.hget_all("nope").await.unwrap().is_empty());

        store.hset("h", "a", "1").await.unwrap();
        assert!(store.hget("h", "b").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_hdel_last_field_removes_key() {
        let store = MemoryStore::new();
        store.hset("h", "a", "1").await.unwrap();
        store.hset("h", "b", "2").await.unwrap();

        store.hdel("h", &["a", "missing"]).await.unwrap();
        assert_eq!(store.hget_all("h").await.unwrap().len(), 1);

        store.hdel("h", &["b"]).await.unwrap();
        assert!(store.is_empty().unwrap());

        // Missing key and empty field list are no-ops
        store.hdel("h", &["b"]).await.unwrap();
        store.hdel("h", &[]).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hash_respects_key_ttl() {
        let store = MemoryStore::new();
        store.hset("h", "a", "1").await.unwrap();
        store.expire("h", 1).await.unwrap();
        store.hset("h", "b", "2").await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(store.hget_all("h").await.unwrap().is_empty());

        // A fresh hset after expiry starts a new hash with no TTL
        store.hset("h", "c", "3").await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        let all = store.hget_all("h").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["c"], "3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_reclaim_expired_keys() {
        let store = MemoryStore::new();
        for i in 0..1000 {
            store
                .set(&format!("tok:{i}"), "1", Some(Duration::from_secs(1)))
                .await
                .unwrap();
        }
        store.set("kept", "1", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.len().unwrap(), 1);

        // Touching an unrelated key frees the expired ones
        store.set("other", "1", None).await.unwrap();
        assert_eq!(store.state.read().unwrap().entries.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_is_rate_limited() {
        let store = MemoryStore::new();
        store.set("a", "1", None).await.unwrap();
        store
            .set("short", "1", Some(Duration::from_millis(100)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(200)).await;
        store.set("b", "1", None).await.unwrap();
        // Swept on the first write; the next sweep is not due yet
        assert_eq!(store.state.read().unwrap().entries.len(), 3);

        tokio::time::advance(SWEEP_INTERVAL).await;
        store.set("c", "1", None).await.unwrap();
        assert_eq!(store.state.read().unwrap().entries.len(), 3);
        assert!(store.get("short").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_wrong_type_is_backend_error() {
        let store = MemoryStore::new();
        store.set("scalar", "v", None).await.unwrap();
        store.hset("hash", "f", "v").await.unwrap();

        assert!(matches!(
            store.hset("scalar", "f", "v").await,
            Err(StoreError::Backend(_))
        ));
        assert!(matches!(
            store.get("hash").await,
            Err(StoreError::Backend(_))
        ));
        assert!(matches!(
            store.hget_all("scalar").await,
            Err(StoreError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_operations_fail_after_close() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        store.close().await.unwrap();

        assert!(matches!(store.get("k").await, Err(StoreError::Closed)));
        assert!(matches!(
            store.set("k", "v", None).await,
            Err(StoreError::Closed)
        ));
        assert!(matches!(store.hget_all("k").await, Err(StoreError::Closed)));
        assert!(matches!(store.close().await, Err(StoreError::Closed)));
    }
}
