//! CLI command implementations for Tessera.

pub mod password;
pub mod store;
pub mod token;

use anyhow::Context;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Read an argument that is either a literal value or a path to a file
/// holding it.
pub(crate) fn read_value_or_file(value: String) -> anyhow::Result<String> {
    let path = Path::new(&value);
    if path.is_file() {
        return fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    Ok(value)
}

/// Parse `key=value` pairs into a claims object.
///
/// Values are parsed as JSON when possible (`admin=true`, `level=3`,
/// `permissions=["read"]`) and kept as strings otherwise.
pub(crate) fn parse_claims(pairs: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut claims = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("Invalid claim '{}', expected key=value", pair))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Invalid claim '{}', key is empty", pair);
        }
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        claims.insert(key.to_string(), value);
    }
    Ok(claims)
}

/// Write `contents` to `output`, or print it when no output is given.
pub(crate) fn emit(contents: &str, output: Option<&PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✔ Written to: {}", path.display());
        }
        None => println!("{}", contents),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_parse_claims() {
        let claims = parse_claims(&[
            "sub=user-1".to_string(),
            "admin=true".to_string(),
            "level=3".to_string(),
            "tags=[\"a\",\"b\"]".to_string(),
            "note=a=b".to_string(),
        ])
        .unwrap();

        assert_eq!(claims["sub"], json!("user-1"));
        assert_eq!(claims["admin"], json!(true));
        assert_eq!(claims["level"], json!(3));
        assert_eq!(claims["tags"], json!(["a", "b"]));
        assert_eq!(claims["note"], json!("a=b"));
    }

    #[test]
    fn test_parse_claims_rejects_bad_pairs() {
        assert!(parse_claims(&["no-equals".to_string()]).is_err());
        assert!(parse_claims(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_read_value_or_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.txt");
        fs::write(&path, "abc.def.ghi\n").unwrap();

        let from_file = read_value_or_file(path.to_string_lossy().to_string()).unwrap();
        assert_eq!(from_file, "abc.def.ghi");

        let literal = read_value_or_file("abc.def.ghi".to_string()).unwrap();
        assert_eq!(literal, "abc.def.ghi");
    }
}
