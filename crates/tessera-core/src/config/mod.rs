//! Configuration types for Tessera.
//!
//! Configuration is loaded from a single TOML file (`tessera.toml` by default)
//! with one table per component:
//!
//! ```toml
//! [token]
//! secret_env = "TESSERA_SECRET"
//! issuer = "tessera"
//! refresh_ttl_minutes = 15
//!
//! [store]
//! backend = "redis"
//! host = "localhost"
//! port = 6379
//! ```
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration as long as the secret can be resolved from the
//! environment.

pub mod store;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

pub use store::{StoreBackend, StoreConfig};
pub use token::TokenConfig;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tessera.toml";

/// Complete Tessera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TesseraConfig {
    /// Token engine settings.
    #[serde(default)]
    pub token: TokenConfig,

    /// Revocation store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl TesseraConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a file if it exists, falling back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string and validate it.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.token.validate()?;
        self.store.validate()?;
        Ok(())
    }
}
