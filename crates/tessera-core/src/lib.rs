//! # tessera-core
//!
//! Configuration types shared across all Tessera crates.
//!
//! Everything here is plain data: the embedding process builds a
//! [`TesseraConfig`] once at startup (usually from `tessera.toml`) and hands the
//! relevant section to the token engine and the revocation store.

pub mod config;
pub mod error;

pub use config::{StoreBackend, StoreConfig, TesseraConfig, TokenConfig};
pub use error::ConfigError;
