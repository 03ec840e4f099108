//! Revocation store configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Backend used for the revocation store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote Redis-compatible server.
    #[default]
    Redis,
    /// In-process map (tests and single-process deployments).
    Memory,
}

/// Connection settings for the revocation store.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Hostname of the store server.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port of the store server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Password for the store server.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Environment variable containing the password (overrides `password`).
    #[serde(default)]
    pub password_env: Option<String>,

    /// Logical database index.
    #[serde(default)]
    pub db: i64,

    /// Upper bound for a single command, in milliseconds. Unbounded if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            host: default_host(),
            port: default_port(),
            password: None,
            password_env: None,
            db: 0,
            command_timeout_ms: None,
        }
    }
}

impl StoreConfig {
    /// In-memory store configuration.
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Default::default()
        }
    }

    /// Resolve the password from `password_env`, falling back to `password`.
    pub fn resolve_password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env {
            if let Ok(password) = std::env::var(env_var) {
                return Some(password);
            }
        }
        self.password.clone()
    }

    /// `host:port` of the store, safe to log.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build a `redis://` connection URL.
    pub fn connection_url(&self) -> String {
        match self.resolve_password().filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(&password),
                self.host,
                self.port,
                self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }

    /// Per-command timeout, if configured.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.db < 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.db",
                reason: format!("must not be negative, got {}", self.db),
            });
        }
        if self.command_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "store.command_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_env", &self.password_env)
            .field("db", &self.db)
            .field("command_timeout_ms", &self.command_timeout_ms)
            .finish()
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}
