//! Credential hashing.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$...`) with a fresh random
//! salt per call, so hashing the same password twice gives different strings.

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use crate::error::HashFailure;

/// Hash a password for storage.
///
/// Any string is accepted, including the empty string.
///
/// # Panics
/// Panics if the hasher itself fails (e.g. the OS entropy source is
/// unavailable). Use [`try_hash_password`] to handle that case instead.
pub fn hash_password(password: &str) -> String {
    match try_hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("{}", e);
            panic!("{e}");
        }
    }
}

/// Hash a password, returning the hasher failure instead of panicking.
pub fn try_hash_password(password: &str) -> Result<String, HashFailure> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| HashFailure(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Check a password against a stored hash.
///
/// A stored value that is not a valid PHC hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("Stored password hash is not a valid PHC string: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
