//! # tessera-store
//!
//! Revocation store adapters for Tessera.
//!
//! Signed tokens carry their own expiry, but revoking one before it expires
//! needs state outside the token. This crate provides:
//! - The [`RevocationStore`] capability trait (scalar get/set/delete with TTL,
//!   hash fields, explicit expire, close)
//! - [`RedisStore`], backed by a Redis-compatible server
//! - [`MemoryStore`], an in-process backend with the same semantics
//! - [`Whitelist`], which tracks active and revoked token ids and per-device
//!   sessions on top of any store
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tessera_core::StoreConfig;
//! use tessera_store::{Whitelist, connect};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = connect(&StoreConfig::default()).await?;
//! let whitelist = Whitelist::new(Arc::from(store));
//!
//! whitelist.allow("token-id", Duration::from_secs(15 * 60)).await?;
//! assert!(whitelist.is_allowed("token-id").await?);
//!
//! whitelist.store().close().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod store;
pub mod whitelist;

pub use error::{StoreError, StoreResult};
pub use keys::{revoked_token_key, session_key, token_key};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{RevocationStore, connect};
pub use whitelist::Whitelist;
