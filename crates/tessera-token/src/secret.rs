//! Signing secret for HS256 tokens.

use jsonwebtoken::{DecodingKey, EncodingKey};
use std::sync::Arc;

use crate::error::TokenError;

/// Shared HMAC secret used to sign and verify tokens.
///
/// The bytes are immutable once constructed. Rotating the secret means
/// building a new [`crate::TokenEngine`].
#[derive(Clone)]
pub struct Secret {
    bytes: Arc<[u8]>,
}

impl Secret {
    /// Secrets shorter than this are accepted but logged as weak (256 bits).
    pub const RECOMMENDED_LENGTH: usize = 32;

    /// Create a secret from raw bytes.
    ///
    /// # Errors
    /// Returns [`TokenError::InvalidSecret`] if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let bytes = secret.as_ref();
        if bytes.is_empty() {
            return Err(TokenError::InvalidSecret("secret must not be empty".to_string()));
        }
        if bytes.len() < Self::RECOMMENDED_LENGTH {
            tracing::warn!(
                "Signing secret is shorter than recommended ({} < {} bytes)",
                bytes.len(),
                Self::RECOMMENDED_LENGTH
            );
        }
        Ok(Self {
            bytes: Arc::from(bytes),
        })
    }

    /// Length of the secret in bytes. Never zero.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.bytes)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.bytes)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("length", &self.bytes.len())
            .finish_non_exhaustive()
    }
}
