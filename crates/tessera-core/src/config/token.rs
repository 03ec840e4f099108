//! Token engine configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Configuration for the token engine.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Inline signing secret. Prefer `secret_env` or `secret_file`.
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,

    /// Environment variable containing the signing secret.
    #[serde(default = "default_secret_env")]
    pub secret_env: Option<String>,

    /// Path to a file containing the signing secret.
    #[serde(default)]
    pub secret_file: Option<PathBuf>,

    /// Issuer written into the `iss` claim of minted tokens.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Clock skew tolerance applied to `exp` when parsing, in seconds.
    #[serde(default)]
    pub leeway_secs: u64,

    /// Lifetime of refresh tokens when no override is given, in minutes.
    #[serde(default = "default_refresh_ttl_minutes")]
    pub refresh_ttl_minutes: i64,

    /// Whether parsing rejects tokens whose `iss` differs from `issuer`.
    #[serde(default)]
    pub validate_issuer: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: None,
            secret_env: default_secret_env(),
            secret_file: None,
            issuer: default_issuer(),
            leeway_secs: 0,
            refresh_ttl_minutes: default_refresh_ttl_minutes(),
            validate_issuer: false,
        }
    }
}

impl TokenConfig {
    /// Create a configuration with an inline secret and defaults elsewhere.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Default::default()
        }
    }

    /// Set the issuer.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set the parse leeway.
    pub fn leeway_secs(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Resolve the signing secret.
    ///
    /// Lookup order: the environment variable named by `secret_env`, then
    /// `secret_file`, then the inline `secret`.
    pub fn resolve_secret(&self) -> Result<String, ConfigError> {
        if let Some(env_var) = &self.secret_env {
            if let Ok(secret) = std::env::var(env_var) {
                if !secret.is_empty() {
                    return Ok(secret);
                }
            }
        }

        if let Some(path) = &self.secret_file {
            if path.exists() {
                let secret = std::fs::read_to_string(path)?;
                return Ok(secret.trim().to_string());
            }
            tracing::warn!("Secret file {} does not exist", path.display());
        }

        if let Some(secret) = &self.secret {
            return Ok(secret.clone());
        }

        Err(ConfigError::MissingSecret {
            hint: self
                .secret_env
                .clone()
                .unwrap_or_else(|| "token.secret".to_string()),
        })
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_ttl_minutes < 0 {
            return Err(ConfigError::InvalidValue {
                field: "token.refresh_ttl_minutes",
                reason: format!("must not be negative, got {}", self.refresh_ttl_minutes),
            });
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "token.issuer",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("secret_env", &self.secret_env)
            .field("secret_file", &self.secret_file)
            .field("issuer", &self.issuer)
            .field("leeway_secs", &self.leeway_secs)
            .field("refresh_ttl_minutes", &self.refresh_ttl_minutes)
            .field("validate_issuer", &self.validate_issuer)
            .finish()
    }
}

fn default_secret_env() -> Option<String> {
    Some("TESSERA_SECRET".to_string())
}

fn default_issuer() -> String {
    "tessera".to_string()
}

fn default_refresh_ttl_minutes() -> i64 {
    15
}
