//! Permission annotations on claims.
//!
//! Permissions are plain strings stored in the `permissions` claim. These
//! methods only change the in-memory [`Claims`]; a token already handed out
//! keeps its original permissions until it expires or is revoked. Re-sign the
//! claims with [`crate::TokenEngine::sign`] to issue the updated token.

use crate::claims::Claims;

impl Claims {
    /// Granted permissions, in grant order.
    pub fn permissions(&self) -> &[String] {
        self.permissions.as_deref().unwrap_or_default()
    }

    /// Check whether a permission has been granted.
    ///
    /// A missing `permissions` claim counts as no permissions.
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions().iter().any(|p| p == name)
    }

    /// Grant a permission. Returns `false` if it was already granted.
    pub fn grant_permission(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let permissions = self.permissions.get_or_insert_with(Vec::new);
        if permissions.contains(&name) {
            return false;
        }
        permissions.push(name);
        true
    }

    /// Revoke a permission. Returns `false` if it was not granted.
    pub fn revoke_permission(&mut self, name: &str) -> bool {
        let Some(permissions) = self.permissions.as_mut() else {
            return false;
        };
        match permissions.iter().position(|p| p == name) {
            Some(index) => {
                permissions.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn dedup_permissions(&mut self) {
        if let Some(permissions) = self.permissions.as_mut() {
            let mut seen = std::collections::HashSet::new();
            permissions.retain(|p| seen.insert(p.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Claims {
        Claims::new("tessera", 0, 60)
    }

    #[test]
    fn test_missing_permissions_is_empty() {
        let claims = claims();
        assert!(claims.permissions().is_empty());
        assert!(!claims.has_permission("read"));
    }

    #[test]
    fn test_grant_creates_list() {
        let mut claims = claims();
        assert!(claims.grant_permission("read"));
        assert!(claims.has_permission("read"));
        assert_eq!(claims.permissions(), ["read"]);
    }

    #[test]
    fn test_grant_is_idempotent() {
        let mut claims = claims();
        assert!(claims.grant_permission("read"));
        assert!(!claims.grant_permission("read"));
        assert_eq!(claims.permissions().iter().filter(|p| *p == "read").count(), 1);
    }

    #[test]
    fn test_grant_keeps_order() {
        let mut claims = claims();
        claims.grant_permission("b");
        claims.grant_permission("a");
        claims.grant_permission("c");
        assert_eq!(claims.permissions(), ["b", "a", "c"]);
    }

    #[test]
    fn test_revoke_removes_permission() {
        let mut claims = claims();
        claims.grant_permission("read");
        claims.grant_permission("write");

        assert!(claims.revoke_permission("read"));
        assert!(!claims.has_permission("read"));
        assert_eq!(claims.permissions(), ["write"]);
    }

    #[test]
    fn test_revoke_absent_is_noop() {
        let mut claims = claims();
        assert!(!claims.revoke_permission("read"));
        assert!(claims.permissions.is_none());

        claims.grant_permission("write");
        assert!(!claims.revoke_permission("read"));
        assert_eq!(claims.permissions(), ["write"]);
    }

    #[test]
    fn test_changes_do_not_leak_into_clones() {
        let original = {
            let mut c = claims();
            c.grant_permission("read");
            c
        };
        let mut copy = original.clone();
        copy.revoke_permission("read");
        copy.grant_permission("admin");

        assert!(original.has_permission("read"));
        assert!(!original.has_permission("admin"));
    }
}
