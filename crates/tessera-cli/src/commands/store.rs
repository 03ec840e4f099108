//! Revocation store commands.
//!
//! Thin wrappers over [`RevocationStore`] for inspecting and repairing
//! whitelist entries by hand.

use anyhow::Context;
use clap::Subcommand;
use std::collections::BTreeMap;
use std::time::Duration;
use tessera_core::StoreConfig;
use tessera_store::{RevocationStore, connect};

#[derive(Subcommand, Debug)]
pub enum StoreAction {
    /// Get a value
    Get { key: String },

    /// Set a value, optionally with a TTL
    Set {
        key: String,
        value: String,
        /// Time to live in seconds (no expiry if omitted)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },

    /// Delete a key
    Del { key: String },

    /// Set or refresh the TTL of an existing key
    Expire { key: String, minutes: u32 },

    /// Get one field of a hash
    Hget { key: String, field: String },

    /// Set one field of a hash
    Hset {
        key: String,
        field: String,
        value: String,
    },

    /// Get every field of a hash
    Hgetall { key: String },

    /// Delete fields from a hash
    Hdel {
        key: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
}

/// Open the configured store, run one action, then close the store.
pub async fn run(config: &StoreConfig, action: StoreAction) -> anyhow::Result<()> {
    let store = connect(config)
        .await
        .with_context(|| format!("Failed to connect to revocation store at {}", config.endpoint()))?;

    let result = execute(store.as_ref(), action).await;
    if let Err(e) = store.close().await {
        tracing::warn!("Failed to close revocation store: {}", e);
    }

    println!("{}", result?);
    Ok(())
}

/// Run one action and render its result.
pub async fn execute(store: &dyn RevocationStore, action: StoreAction) -> anyhow::Result<String> {
    let output = match action {
        StoreAction::Get { key } => store.get(&key).await?,
        StoreAction::Set {
            key,
            value,
            ttl_secs,
        } => {
            store
                .set(&key, &value, ttl_secs.map(Duration::from_secs))
                .await?;
            "OK".to_string()
        }
        StoreAction::Del { key } => {
            store.delete(&key).await?;
            "OK".to_string()
        }
        StoreAction::Expire { key, minutes } => {
            store.expire(&key, minutes).await?;
            "OK".to_string()
        }
        StoreAction::Hget { key, field } => store.hget(&key, &field).await?,
        StoreAction::Hset { key, field, value } => {
            store.hset(&key, &field, &value).await?;
            "OK".to_string()
        }
        StoreAction::Hgetall { key } => {
            let fields: BTreeMap<_, _> = store.hget_all(&key).await?.into_iter().collect();
            if fields.is_empty() {
                "(empty)".to_string()
            } else {
                fields
                    .iter()
                    .map(|(field, value)| format!("{field}: {value}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        StoreAction::Hdel { key, fields } => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            store.hdel(&key, &fields).await?;
            "OK".to_string()
        }
    };
    Ok(output)
}
