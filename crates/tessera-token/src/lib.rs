//! # tessera-token
//!
//! Signed bearer tokens for Tessera.
//!
//! This crate provides functionality for:
//! - Minting HS256 access and refresh tokens with custom claims
//! - Parsing and verifying tokens (signature, algorithm, expiry)
//! - Granting, revoking and checking permissions carried in claims
//! - Hashing and verifying passwords (Argon2id)
//!
//! ## Token Lifecycle
//!
//! | Step | Operation | Result |
//! |------|-----------|--------|
//! | Issue | [`TokenEngine::mint`] / [`TokenEngine::mint_refresh`] | Signed token string |
//! | Check | [`TokenEngine::parse`] | [`ParsedToken`] with verified [`Claims`] |
//! | Change | [`Claims::grant_permission`] / [`Claims::revoke_permission`] | Modified claims copy |
//! | Re-issue | [`TokenEngine::sign`] | New token; the old one stays valid until expiry or revocation |
//!
//! A signed token is immutable. Permission changes only take effect once the
//! caller re-signs the modified claims and hands out the new token.

pub mod claims;
pub mod error;
pub mod password;
pub mod permissions;
pub mod secret;
pub mod token;

pub use claims::{Claims, RESERVED_CLAIMS};
pub use error::{HashFailure, TokenError};
pub use password::{hash_password, try_hash_password, verify_password};
pub use secret::Secret;
pub use token::{ParsedToken, TokenEngine, TokenInfo, inspect_unverified};
