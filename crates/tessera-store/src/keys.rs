//! Key layout shared by everything that writes to the revocation store.

const PREFIX: &str = "tessera";

/// Whitelist entry for an active token.
pub fn token_key(token_id: &str) -> String {
    format!("{PREFIX}:token:{token_id}")
}

/// Revocation marker for a token that must no longer be accepted.
pub fn revoked_token_key(token_id: &str) -> String {
    format!("{PREFIX}:revoked:{token_id}")
}

/// Per-principal hash of device → token id.
pub fn session_key(principal: &str) -> String {
    format!("{PREFIX}:session:{principal}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(token_key("abc"), "tessera:token:abc");
        assert_eq!(revoked_token_key("abc"), "tessera:revoked:abc");
        assert_eq!(session_key("user-1"), "tessera:session:user-1");
    }
}
