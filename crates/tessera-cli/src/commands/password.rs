//! Password hashing commands.
//!
//! `tessera password hash` - Hash a password for storage.
//! `tessera password verify` - Check a password against a stored hash.

use anyhow::Context;
use std::path::PathBuf;
use tessera_token::{try_hash_password, verify_password};

use super::{emit, read_value_or_file};

/// Hash a password and print (or write) the PHC string.
pub fn hash(password: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let hash = try_hash_password(password).context("Failed to hash password")?;
    emit(&hash, output.as_ref())
}

/// Verify a password against a hash given inline or as a file path.
pub fn verify(password: &str, hash: String) -> anyhow::Result<()> {
    let hash = read_value_or_file(hash)?;
    if !verify_password(password, &hash) {
        anyhow::bail!("✖ Password does not match");
    }
    println!("✔ Password matches");
    Ok(())
}
