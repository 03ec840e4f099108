//! Token whitelist and per-device sessions on top of a [`RevocationStore`].
//!
//! A token is accepted only while its id is whitelisted and carries no
//! revocation marker. Both entries get a TTL equal to the token's remaining
//! lifetime, so the store never outlives the token it describes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreResult;
use crate::keys::{revoked_token_key, session_key, token_key};
use crate::store::RevocationStore;

const ALLOWED: &str = "1";
const REVOKED: &str = "revoked";

/// Tracks active and revoked token ids.
#[derive(Clone)]
pub struct Whitelist {
    store: Arc<dyn RevocationStore>,
}

impl Whitelist {
    pub fn new(store: Arc<dyn RevocationStore>) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<dyn RevocationStore> {
        &self.store
    }

    /// Whitelist a token id for `ttl`. A zero TTL removes it instead.
    pub async fn allow(&self, token_id: &str, ttl: Duration) -> StoreResult<()> {
        let key = token_key(token_id);
        if ttl.is_zero() {
            return self.store.delete(&key).await;
        }
        self.store.set(&key, ALLOWED, Some(ttl)).await
    }

    /// Whether a token id is whitelisted and not revoked.
    pub async fn is_allowed(&self, token_id: &str) -> StoreResult<bool> {
        if self.is_revoked(token_id).await? {
            return Ok(false);
        }
        exists(self.store.get(&token_key(token_id)).await)
    }

    /// Whether a token id carries a revocation marker.
    pub async fn is_revoked(&self, token_id: &str) -> StoreResult<bool> {
        exists(self.store.get(&revoked_token_key(token_id)).await)
    }

    /// Revoke a token id.
    ///
    /// The marker lives for `ttl`, which should be the token's remaining
    /// lifetime; while it exists the id cannot be allowed again.
    pub async fn revoke(&self, token_id: &str, ttl: Duration) -> StoreResult<()> {
        self.store.delete(&token_key(token_id)).await?;
        if !ttl.is_zero() {
            self.store
                .set(&revoked_token_key(token_id), REVOKED, Some(ttl))
                .await?;
        }
        tracing::debug!("Revoked token {}", token_id);
        Ok(())
    }

    /// Record which token a principal's device is using.
    ///
    /// With `ttl_minutes`, the whole session hash expires that long after the
    /// most recent device was recorded.
    pub async fn record_device(
        &self,
        principal: &str,
        device: &str,
        token_id: &str,
        ttl_minutes: Option<u32>,
    ) -> StoreResult<()> {
        let key = session_key(principal);
        self.store.hset(&key, device, token_id).await?;
        if let Some(minutes) = ttl_minutes {
            self.store.expire(&key, minutes).await?;
        }
        Ok(())
    }

    /// Token id currently recorded for one device.
    pub async fn device_token(&self, principal: &str, device: &str) -> StoreResult<Option<String>> {
        match self.store.hget(&session_key(principal), device).await {
            Ok(token_id) => Ok(Some(token_id)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// All devices of a principal with their token ids.
    pub async fn devices(&self, principal: &str) -> StoreResult<HashMap<String, String>> {
        self.store.hget_all(&session_key(principal)).await
    }

    /// Drop a device from a principal's session without revoking its token.
    pub async fn forget_device(&self, principal: &str, device: &str) -> StoreResult<()> {
        self.store.hdel(&session_key(principal), &[device]).await
    }

    /// Revoke every device token of a principal and drop the session.
    ///
    /// Returns the number of tokens revoked.
    pub async fn revoke_all(&self, principal: &str, ttl: Duration) -> StoreResult<usize> {
        let devices = self.devices(principal).await?;
        for token_id in devices.values() {
            self.revoke(token_id, ttl).await?;
        }
        self.store.delete(&session_key(principal)).await?;
        tracing::info!(
            "Revoked {} session token(s) for principal {}",
            devices.len(),
            principal
        );
        Ok(devices.len())
    }
}

impl std::fmt::Debug for Whitelist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Whitelist").finish_non_exhaustive()
    }
}

fn exists(result: StoreResult<String>) -> StoreResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}
