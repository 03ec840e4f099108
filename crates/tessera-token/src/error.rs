//! Error types for the token crate.

use thiserror::Error;

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Requested lifetime is negative.
    #[error("invalid token lifetime: {ttl_minutes} minutes")]
    InvalidTtl { ttl_minutes: i64 },

    /// Token is not a well-formed compact JWS.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Signature does not match the configured secret.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Header declares an algorithm other than HS256.
    #[error("unsupported signing algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Token `exp` is in the past.
    #[error("token has expired")]
    TokenExpired,

    /// A reserved claim has the wrong type or value.
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// Signing secret is unusable.
    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    /// Encoding the token failed.
    #[error("failed to sign token: {0}")]
    SigningFailed(String),
}

impl TokenError {
    /// Whether this error means "the presented token cannot be trusted".
    ///
    /// Transports should answer all of these with the same unauthenticated
    /// response instead of exposing the specific reason.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken(_)
                | Self::SignatureInvalid
                | Self::UnsupportedAlgorithm { .. }
                | Self::TokenExpired
                | Self::InvalidClaims(_)
        )
    }

    /// Stable error code for logs and API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTtl { .. } => "INVALID_TTL",
            Self::MalformedToken(_) => "MALFORMED_TOKEN",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::UnsupportedAlgorithm { .. } => "UNSUPPORTED_ALGORITHM",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidClaims(_) => "INVALID_CLAIMS",
            Self::InvalidSecret(_) => "INVALID_SECRET",
            Self::SigningFailed(_) => "SIGNING_FAILED",
        }
    }
}

impl From<tessera_core::ConfigError> for TokenError {
    fn from(err: tessera_core::ConfigError) -> Self {
        Self::InvalidSecret(err.to_string())
    }
}

/// The password hash primitive itself failed.
///
/// This indicates a broken entropy source or hasher, never bad user input.
#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashFailure(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failures_are_auth_failures() {
        assert!(TokenError::SignatureInvalid.is_auth_failure());
        assert!(TokenError::TokenExpired.is_auth_failure());
        assert!(TokenError::MalformedToken("x".into()).is_auth_failure());
        assert!(
            TokenError::UnsupportedAlgorithm {
                algorithm: "RS256".into()
            }
            .is_auth_failure()
        );
        assert!(!TokenError::InvalidTtl { ttl_minutes: -1 }.is_auth_failure());
        assert!(!TokenError::SigningFailed("x".into()).is_auth_failure());
    }
}
