//! Token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TokenError;

/// Claims carried by a Tessera token.
///
/// The registered claims are typed fields; anything else the caller supplies
/// at mint time lives in `custom` and is flattened into the same JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time (seconds since the Unix epoch).
    pub exp: i64,

    /// Issued-at time (seconds since the Unix epoch).
    pub iat: i64,

    /// Issuer.
    pub iss: String,

    /// Token identifier, used as the revocation store key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Granted permissions, in grant order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) permissions: Option<Vec<String>>,

    /// Caller-supplied claims. Never holds a reserved name.
    #[serde(flatten)]
    pub(crate) custom: Map<String, Value>,
}

/// Claim names with a typed field on [`Claims`].
pub const RESERVED_CLAIMS: [&str; 5] = ["exp", "iat", "iss", "jti", "permissions"];

impl Claims {
    /// Create claims with the registered fields set and nothing else.
    pub fn new(iss: impl Into<String>, iat: i64, exp: i64) -> Self {
        Self {
            exp,
            iat,
            iss: iss.into(),
            jti: None,
            permissions: None,
            custom: Map::new(),
        }
    }

    /// Set the token identifier.
    pub fn with_token_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Token identifier, if any.
    pub fn token_id(&self) -> Option<&str> {
        self.jti.as_deref()
    }

    /// Look up a custom claim.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.custom.get(key)
    }

    /// All custom claims.
    pub fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }

    /// Remove a custom claim. Reserved claims cannot be removed.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.custom.remove(key)
    }

    /// Insert or replace a custom claim.
    ///
    /// Reserved names (`exp`, `iat`, `iss`, `jti`, `permissions`) are routed
    /// to their typed fields and must have the matching JSON type.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), TokenError> {
        let mut overlay = Map::new();
        overlay.insert(key.into(), value);
        self.overlay(overlay)
    }

    /// Overlay claims on top of these, last write wins.
    ///
    /// Reserved claims may be overwritten too, which lets a caller pin `exp`
    /// or `iss` explicitly. Duplicate permissions are collapsed afterwards.
    pub fn overlay(&mut self, claims: Map<String, Value>) -> Result<(), TokenError> {
        if claims.is_empty() {
            return Ok(());
        }

        let mut merged = match serde_json::to_value(&*self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(TokenError::InvalidClaims("claims must be an object".into())),
            Err(e) => return Err(TokenError::InvalidClaims(e.to_string())),
        };
        merged.extend(claims);

        let mut updated: Claims = serde_json::from_value(Value::Object(merged))
            .map_err(|e| TokenError::InvalidClaims(e.to_string()))?;
        updated.validate()?;
        updated.dedup_permissions();

        *self = updated;
        Ok(())
    }

    /// Check the invariants a signed token relies on.
    ///
    /// Timestamps must not be negative (verifiers read them as unsigned), and
    /// no reserved name may appear among the custom claims, where it would be
    /// serialized a second time.
    pub(crate) fn validate(&self) -> Result<(), TokenError> {
        if self.exp < 0 {
            return Err(TokenError::InvalidClaims(format!(
                "exp must not be negative, got {}",
                self.exp
            )));
        }
        if self.iat < 0 {
            return Err(TokenError::InvalidClaims(format!(
                "iat must not be negative, got {}",
                self.iat
            )));
        }
        if let Some(key) = RESERVED_CLAIMS.into_iter().find(|k| self.custom.contains_key(*k)) {
            return Err(TokenError::InvalidClaims(format!(
                "reserved claim {key} set as a custom claim"
            )));
        }
        Ok(())
    }

    /// Expiration as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Issued-at as a timestamp.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Check if the claims have expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Claims {
        Claims::new("tessera", 1_700_000_000, 1_700_000_600)
    }

    #[test]
    fn test_custom_claims_flatten() {
        let mut claims = sample();
        claims.insert("sub", json!("user-1")).unwrap();

        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["sub"], "user-1");
        assert_eq!(value["exp"], 1_700_000_600);
        assert!(value.get("permissions").is_none());
        assert!(value.get("custom").is_none());
    }

    #[test]
    fn test_overlay_last_write_wins() {
        let mut claims = sample();
        let mut overlay = Map::new();
        overlay.insert("iss".into(), json!("someone-else"));
        overlay.insert("exp".into(), json!(42));
        overlay.insert("tenant".into(), json!("acme"));
        claims.overlay(overlay).unwrap();

        assert_eq!(claims.iss, "someone-else");
        assert_eq!(claims.exp, 42);
        assert_eq!(claims.get("tenant"), Some(&json!("acme")));
    }

    #[test]
    fn test_overlay_rejects_mistyped_reserved_claim() {
        let mut claims = sample();
        let result = claims.insert("exp", json!("tomorrow"));
        assert!(matches!(result, Err(TokenError::InvalidClaims(_))));
        // Unchanged on failure
        assert_eq!(claims.exp, 1_700_000_600);
    }

    #[test]
    fn test_overlay_rejects_non_list_permissions() {
        let mut claims = sample();
        let result = claims.insert("permissions", json!("admin"));
        assert!(matches!(result, Err(TokenError::InvalidClaims(_))));
    }

    #[test]
    fn test_overlay_rejects_negative_timestamps() {
        let mut claims = sample();
        assert!(matches!(
            claims.insert("exp", json!(-1)),
            Err(TokenError::InvalidClaims(_))
        ));
        assert!(matches!(
            claims.insert("iat", json!(-10)),
            Err(TokenError::InvalidClaims(_))
        ));
        assert_eq!(claims.exp, 1_700_000_600);
        assert_eq!(claims.iat, 1_700_000_000);
    }

    #[test]
    fn test_reserved_names_never_land_in_custom() {
        let mut claims = sample();
        claims.insert("permissions", json!(["read"])).unwrap();
        claims.insert("jti", json!("abc")).unwrap();

        assert!(claims.custom().is_empty());
        assert_eq!(claims.token_id(), Some("abc"));
        assert!(claims.validate().is_ok());

        claims.custom.insert("exp".into(), json!(9_999_999_999i64));
        assert!(matches!(claims.validate(), Err(TokenError::InvalidClaims(_))));
    }

    #[test]
    fn test_remove_custom_claim() {
        let mut claims = sample();
        claims.insert("tenant", json!("acme")).unwrap();
        assert_eq!(claims.remove("tenant"), Some(json!("acme")));
        assert_eq!(claims.remove("exp"), None);
        assert_eq!(claims.exp, 1_700_000_600);
    }

    #[test]
    fn test_overlay_collapses_duplicate_permissions() {
        let mut claims = sample();
        claims
            .insert("permissions", json!(["read", "write", "read"]))
            .unwrap();
        assert_eq!(claims.permissions(), ["read", "write"]);
    }

    #[test]
    fn test_timestamps() {
        let claims = sample();
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_600);
        assert_eq!(claims.issued_at().unwrap().timestamp(), 1_700_000_000);
        assert!(claims.is_expired());
    }
}
