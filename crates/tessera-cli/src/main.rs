use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tessera_core::TesseraConfig;
use tessera_core::config::DEFAULT_CONFIG_FILE;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::store::StoreAction;

#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Tessera token lifecycle CLI")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, env = "TESSERA_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mint, verify and re-issue tokens
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Hash and verify passwords
    Password {
        #[command(subcommand)]
        cmd: PasswordCommand,
    },

    /// Inspect and modify the revocation store
    Store {
        /// Use the in-process store instead of the configured backend
        #[arg(long, default_value_t = false)]
        memory: bool,

        #[command(subcommand)]
        cmd: StoreAction,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Mint an access token
    Mint {
        /// Lifetime in minutes
        #[arg(long)]
        ttl: i64,

        /// Custom claim as key=value (repeatable). Values are parsed as JSON when possible.
        #[arg(long = "claim")]
        claims: Vec<String>,

        /// Permission to grant (repeatable)
        #[arg(long = "permission")]
        permissions: Vec<String>,

        /// Write the token to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Mint a refresh token
    Refresh {
        /// Lifetime in minutes (defaults to token.refresh_ttl_minutes)
        #[arg(long)]
        ttl: Option<i64>,

        /// Custom claim as key=value (repeatable)
        #[arg(long = "claim")]
        claims: Vec<String>,

        /// Write the token to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Verify a token (string or file path) and print its claims
    Verify {
        token: String,

        /// Also report whether the token expires within this many minutes
        #[arg(long)]
        within: Option<i64>,
    },

    /// Decode a token without verifying it
    Inspect { token: String },

    /// Re-issue a token with a permission granted
    Grant {
        token: String,
        permission: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Re-issue a token with a permission revoked
    Revoke {
        token: String,
        permission: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum PasswordCommand {
    /// Hash a password
    Hash {
        #[arg(long, env = "TESSERA_PASSWORD", hide_env_values = true)]
        password: String,

        /// Write the hash to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Verify a password against a hash (string or file path)
    Verify {
        #[arg(long, env = "TESSERA_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        hash: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TesseraConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    match cli.cmd {
        Command::Token { cmd } => run_token(&config, cmd)?,
        Command::Password { cmd } => match cmd {
            PasswordCommand::Hash { password, output } => {
                commands::password::hash(&password, output)?
            }
            PasswordCommand::Verify { password, hash } => {
                commands::password::verify(&password, hash)?
            }
        },
        Command::Store { memory, cmd } => {
            let store_config = if memory {
                tessera_core::StoreConfig::memory()
            } else {
                config.store.clone()
            };
            commands::store::run(&store_config, cmd).await?
        }
    }

    Ok(())
}

fn run_token(config: &TesseraConfig, cmd: TokenCommand) -> anyhow::Result<()> {
    let token_config = &config.token;
    match cmd {
        TokenCommand::Mint {
            ttl,
            claims,
            permissions,
            output,
        } => commands::token::mint(token_config, ttl, &claims, &permissions, output),
        TokenCommand::Refresh {
            ttl,
            claims,
            output,
        } => commands::token::refresh(token_config, ttl, &claims, output),
        TokenCommand::Verify { token, within } => {
            commands::token::verify(token_config, token, within)
        }
        TokenCommand::Inspect { token } => commands::token::inspect(token),
        TokenCommand::Grant {
            token,
            permission,
            output,
        } => commands::token::grant(token_config, token, &permission, output),
        TokenCommand::Revoke {
            token,
            permission,
            output,
        } => commands::token::revoke(token_config, token, &permission, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_store_command() {
        let cli = Cli::try_parse_from([
            "tessera", "store", "--memory", "hdel", "session:alice", "laptop", "phone",
        ])
        .unwrap();
        match cli.cmd {
            Command::Store {
                memory: true,
                cmd: StoreAction::Hdel { key, fields },
            } => {
                assert_eq!(key, "session:alice");
                assert_eq!(fields, ["laptop", "phone"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_token_mint() {
        let cli = Cli::try_parse_from([
            "tessera",
            "--config",
            "custom.toml",
            "token",
            "mint",
            "--ttl",
            "10",
            "--claim",
            "sub=alice",
            "--permission",
            "read",
            "--permission",
            "write",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        match cli.cmd {
            Command::Token {
                cmd:
                    TokenCommand::Mint {
                        ttl,
                        claims,
                        permissions,
                        output,
                    },
            } => {
                assert_eq!(ttl, 10);
                assert_eq!(claims, ["sub=alice"]);
                assert_eq!(permissions, ["read", "write"]);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
