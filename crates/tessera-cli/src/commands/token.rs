//! Token management commands.
//!
//! `tessera token mint` - Mint an access token.
//! `tessera token refresh` - Mint a refresh token.
//! `tessera token verify` - Verify a token and show its claims.
//! `tessera token inspect` - Decode a token without verifying it.
//! `tessera token grant` / `revoke` - Re-issue a token with a permission added or removed.

use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tessera_core::TokenConfig;
use tessera_token::{Claims, ParsedToken, TokenEngine, inspect_unverified};

use super::{emit, parse_claims, read_value_or_file};

fn engine(config: &TokenConfig) -> anyhow::Result<TokenEngine> {
    TokenEngine::from_config(config).context("Failed to build token engine")
}

fn parse(engine: &TokenEngine, token: String) -> anyhow::Result<ParsedToken> {
    let token = read_value_or_file(token)?;
    engine.parse(&token).context("Token verification failed")
}

/// Mint an access token.
pub fn mint(
    config: &TokenConfig,
    ttl_minutes: i64,
    claims: &[String],
    permissions: &[String],
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let token = mint_token(config, ttl_minutes, claims, permissions)?;
    emit(&token, output.as_ref())
}

fn mint_token(
    config: &TokenConfig,
    ttl_minutes: i64,
    claims: &[String],
    permissions: &[String],
) -> anyhow::Result<String> {
    let engine = engine(config)?;
    let mut custom = parse_claims(claims)?;
    if !permissions.is_empty() {
        custom.insert("permissions".to_string(), serde_json::json!(permissions));
    }
    engine
        .mint(ttl_minutes, custom)
        .context("Failed to mint token")
}

/// Mint a refresh token, defaulting to the configured refresh lifetime.
pub fn refresh(
    config: &TokenConfig,
    ttl_minutes: Option<i64>,
    claims: &[String],
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let engine = engine(config)?;
    let token = engine
        .mint_refresh(parse_claims(claims)?, ttl_minutes)
        .context("Failed to mint refresh token")?;
    emit(&token, output.as_ref())
}

/// Verify a token and print its claims.
///
/// With `within`, also reports whether the token expires within that many
/// minutes.
pub fn verify(config: &TokenConfig, token: String, within: Option<i64>) -> anyhow::Result<()> {
    let engine = engine(config)?;
    let parsed = parse(&engine, token)?;
    let claims = engine.get_claims(&parsed);

    println!("✔ Token is valid");
    println!();
    print_claims(&claims);

    if let Some(minutes) = within {
        let expiring = engine.is_expiring_within(&parsed, minutes);
        println!(
            "  Expiring within {} min: {}",
            minutes,
            if expiring { "yes" } else { "no" }
        );
    }

    Ok(())
}

/// Decode a token without checking its signature or expiry.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token = read_value_or_file(token)?;
    let info = inspect_unverified(&token).context("Failed to decode token")?;

    println!("Token Information (unverified):");
    println!("  Algorithm: {}", info.algorithm);
    println!();
    println!("{}", serde_json::to_string_pretty(&info.claims)?);

    Ok(())
}

/// Re-issue a verified token with a permission granted.
pub fn grant(
    config: &TokenConfig,
    token: String,
    permission: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let reissued = change_permission(config, token, |claims| {
        claims.grant_permission(permission)
    })?;
    emit(&reissued, output.as_ref())
}

/// Re-issue a verified token with a permission revoked.
pub fn revoke(
    config: &TokenConfig,
    token: String,
    permission: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let reissued = change_permission(config, token, |claims| {
        claims.revoke_permission(permission)
    })?;
    emit(&reissued, output.as_ref())
}

fn change_permission(
    config: &TokenConfig,
    token: String,
    change: impl FnOnce(&mut Claims) -> bool,
) -> anyhow::Result<String> {
    let engine = engine(config)?;
    let parsed = parse(&engine, token)?;

    let mut claims = engine.get_claims(&parsed);
    if !change(&mut claims) {
        tracing::info!("Permissions unchanged, re-issuing token as is");
    }
    engine.sign(&claims).context("Failed to re-issue token")
}

fn print_claims(claims: &Claims) {
    println!("Token Details:");
    println!("  Issuer: {}", claims.iss);
    println!("  Issued at: {}", format_timestamp(claims.issued_at()));
    println!("  Expires at: {}", format_timestamp(claims.expires_at()));
    if let Some(id) = claims.token_id() {
        println!("  Token ID: {}", id);
    }
    if claims.permissions().is_empty() {
        println!("  Permissions: (none)");
    } else {
        println!("  Permissions: {}", claims.permissions().join(", "));
    }
    for (key, value) in claims.custom() {
        println!("  {}: {}", key, value);
    }
}

fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "(out of range)".to_string())
}
