//! Token minting and verification.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tessera_core::TokenConfig;
use uuid::Uuid;

use crate::claims::Claims;
use crate::error::TokenError;
use crate::secret::Secret;

/// The only accepted signing algorithm.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

const ALGORITHM_NAME: &str = "HS256";

/// Mints and verifies HS256 tokens with a single shared secret.
///
/// The engine is immutable after construction and cheap to clone, so one
/// instance can be shared across threads without locking.
#[derive(Clone)]
pub struct TokenEngine {
    issuer: Arc<str>,
    refresh_ttl_minutes: i64,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    secret_len: usize,
}

impl TokenEngine {
    /// Create an engine from a secret and configuration.
    ///
    /// The secret fields of `config` are ignored; use [`TokenEngine::from_config`]
    /// to resolve the secret from the configuration as well.
    pub fn new(secret: Secret, config: &TokenConfig) -> Result<Self, TokenError> {
        if config.refresh_ttl_minutes < 0 {
            return Err(TokenError::InvalidTtl {
                ttl_minutes: config.refresh_ttl_minutes,
            });
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        if config.validate_issuer {
            validation.set_issuer(&[&config.issuer]);
        }

        Ok(Self {
            issuer: Arc::from(config.issuer.as_str()),
            refresh_ttl_minutes: config.refresh_ttl_minutes,
            encoding_key: Arc::new(secret.encoding_key()),
            decoding_key: Arc::new(secret.decoding_key()),
            validation: Arc::new(validation),
            secret_len: secret.byte_len(),
        })
    }

    /// Create an engine, resolving the secret from the configuration.
    pub fn from_config(config: &TokenConfig) -> Result<Self, TokenError> {
        let secret = Secret::new(config.resolve_secret()?)?;
        Self::new(secret, config)
    }

    /// Create an engine with default settings.
    pub fn with_secret(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        Self::new(Secret::new(secret)?, &TokenConfig::default())
    }

    /// Issuer written into minted tokens.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Default lifetime of refresh tokens, in minutes.
    pub fn refresh_ttl_minutes(&self) -> i64 {
        self.refresh_ttl_minutes
    }

    /// Mint a token that expires `ttl_minutes` from now.
    ///
    /// `custom_claims` are applied on top of the registered claims, so a
    /// caller can override `iss`, `iat` or `exp` if it really means to. A TTL
    /// of zero is allowed and yields a token that expires immediately.
    pub fn mint(
        &self,
        ttl_minutes: i64,
        custom_claims: Map<String, Value>,
    ) -> Result<String, TokenError> {
        if ttl_minutes < 0 {
            tracing::debug!("Refusing to mint token with negative ttl {}", ttl_minutes);
            return Err(TokenError::InvalidTtl { ttl_minutes });
        }

        let now = Utc::now().timestamp();
        let exp = ttl_minutes
            .checked_mul(60)
            .and_then(|secs| now.checked_add(secs))
            .ok_or(TokenError::InvalidTtl { ttl_minutes })?;

        let mut claims =
            Claims::new(&*self.issuer, now, exp).with_token_id(Uuid::new_v4().to_string());
        claims.overlay(custom_claims)?;

        self.sign(&claims)
    }

    /// Mint a refresh token.
    ///
    /// Same as [`TokenEngine::mint`] with the lifetime defaulting to the
    /// configured refresh TTL (15 minutes unless configured otherwise).
    pub fn mint_refresh(
        &self,
        custom_claims: Map<String, Value>,
        ttl_override: Option<i64>,
    ) -> Result<String, TokenError> {
        self.mint(ttl_override.unwrap_or(self.refresh_ttl_minutes), custom_claims)
    }

    /// Sign claims as they are, without touching `iat` or `exp`.
    ///
    /// This is how modified claims (e.g. after a permission grant) become a
    /// new token.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        claims.validate()?;
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            TokenError::SigningFailed(e.to_string())
        })
    }

    /// Verify a token and extract its claims.
    ///
    /// Rejects any header algorithm other than HS256 before looking at the
    /// signature, then checks the signature and `exp`.
    pub fn parse(&self, token: &str) -> Result<ParsedToken, TokenError> {
        let algorithm = peek_algorithm(token)?;
        if algorithm != ALGORITHM_NAME {
            tracing::debug!("Rejecting token signed with {}", algorithm);
            return Err(TokenError::UnsupportedAlgorithm { algorithm });
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Token validation failed: {}", e);
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    TokenError::UnsupportedAlgorithm {
                        algorithm: ALGORITHM_NAME.to_string(),
                    }
                }
                ErrorKind::InvalidIssuer => TokenError::InvalidClaims("unexpected issuer".into()),
                _ => TokenError::MalformedToken(e.to_string()),
            }
        })?;

        Ok(ParsedToken {
            claims: data.claims,
        })
    }

    /// Copy of the claims of a parsed token.
    pub fn get_claims(&self, parsed: &ParsedToken) -> Claims {
        parsed.claims()
    }

    /// Whether the token expires within `minutes` from now (inclusive).
    pub fn is_expiring_within(&self, parsed: &ParsedToken, minutes: i64) -> bool {
        self.is_expiring_within_at(parsed, minutes, Utc::now())
    }

    /// [`TokenEngine::is_expiring_within`] against an explicit instant.
    pub fn is_expiring_within_at(
        &self,
        parsed: &ParsedToken,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> bool {
        let remaining_ms = parsed
            .claims
            .exp
            .saturating_mul(1000)
            .saturating_sub(now.timestamp_millis());
        remaining_ms as f64 / 60_000.0 <= minutes as f64
    }
}

impl std::fmt::Debug for TokenEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEngine")
            .field("issuer", &self.issuer)
            .field("algorithm", &ALGORITHM)
            .field("refresh_ttl_minutes", &self.refresh_ttl_minutes)
            .field("secret_len", &self.secret_len)
            .finish_non_exhaustive()
    }
}

/// A verified token.
///
/// Claims are only handed out as copies; changing them requires signing a
/// new token.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    claims: Claims,
}

impl ParsedToken {
    /// Signing algorithm of the verified token (always HS256).
    pub fn algorithm(&self) -> Algorithm {
        ALGORITHM
    }

    /// Copy of the verified claims.
    pub fn claims(&self) -> Claims {
        self.claims.clone()
    }

    /// Token identifier, if the token carries one.
    pub fn token_id(&self) -> Option<&str> {
        self.claims.token_id()
    }

    /// Expiration time.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims.expires_at()
    }

    /// Read-only permission check against the verified claims.
    pub fn has_permission(&self, name: &str) -> bool {
        self.claims.has_permission(name)
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Decode the header of a compact token and return its `alg`.
fn peek_algorithm(token: &str) -> Result<String, TokenError> {
    let header = token_segments(token)?[0];
    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| TokenError::MalformedToken(format!("header is not base64url: {e}")))?;
    let raw: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::MalformedToken(format!("header is not valid JSON: {e}")))?;
    Ok(raw.alg)
}

fn token_segments(token: &str) -> Result<[&str; 3], TokenError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(claims), Some(signature), None)
            if !header.is_empty() && !claims.is_empty() =>
        {
            Ok([header, claims, signature])
        }
        _ => Err(TokenError::MalformedToken(
            "expected three dot-separated segments".to_string(),
        )),
    }
}

/// Decoded contents of a token, without any verification.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// Declared signing algorithm.
    pub algorithm: String,
    /// Raw claims object.
    pub claims: Map<String, Value>,
}

/// Decode a token without checking its signature or expiry (for debugging).
pub fn inspect_unverified(token: &str) -> Result<TokenInfo, TokenError> {
    let algorithm = peek_algorithm(token)?;
    let payload = token_segments(token)?[1];
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| TokenError::MalformedToken(format!("claims are not base64url: {e}")))?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::MalformedToken(format!("claims are not a JSON object: {e}")))?;

    Ok(TokenInfo { algorithm, claims })
}
