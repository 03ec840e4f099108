//! Error types for configuration loading.

use thiserror::Error;

/// Errors that can occur while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration or secret file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the TOML configuration.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// No signing secret could be resolved.
    #[error("signing secret not configured (set {hint})")]
    MissingSecret { hint: String },

    /// A configured value is out of range.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
