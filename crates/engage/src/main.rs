// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engage - multi-tenant WhatsApp customer engagement.
//!
//! This is the binary entry point.

mod dispatch;
mod outbound;
mod serve;
mod shutdown;
mod transport;

use std::time::Duration;

use clap::{Parser, Subcommand};
use engage_config::EngageConfig;
use engage_core::EngageError;
use engage_gateway::TokenAuthority;
use engage_vault::SecretBox;

/// Engage - multi-tenant WhatsApp customer engagement.
#[derive(Parser, Debug)]
#[command(name = "engage", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the gateway, session manager and trigger engine.
    Serve,
    /// Encrypt a credential for storage (prints hex ciphertext).
    Encrypt {
        /// Plaintext value, e.g. a Cloud API access token.
        value: String,
    },
    /// Mint a real-time channel token for local testing.
    IssueToken {
        #[arg(long)]
        company: String,
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match engage_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            engage_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Encrypt { value } => encrypt(&config, &value).map(|hex| println!("{hex}")),
        Commands::IssueToken { company, user } => {
            issue_token(&config, &company, &user).map(|token| println!("{token}"))
        }
    };

    if let Err(e) = result {
        eprintln!("engage: {e}");
        std::process::exit(1);
    }
}

/// Returns a required secret or a configuration error naming its key.
pub(crate) fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, EngageError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| EngageError::Config(format!("{key} is required")))
}

fn encrypt(config: &EngageConfig, value: &str) -> Result<String, EngageError> {
    let key = required(&config.security.encryption_key, "security.encryption_key")?;
    SecretBox::new(key)?.encrypt(value)
}

fn issue_token(config: &EngageConfig, company: &str, user: &str) -> Result<String, EngageError> {
    token_authority(config)?.issue(user, company)
}

pub(crate) fn token_authority(config: &EngageConfig) -> Result<TokenAuthority, EngageError> {
    let secret = required(&config.security.jwt_secret, "security.jwt_secret")?;
    TokenAuthority::new(secret, Duration::from_secs(config.security.token_ttl_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngageConfig {
        let mut config = EngageConfig::default();
        config.security.encryption_key = Some("cli-test-encryption-key".into());
        config.security.jwt_secret = Some("cli-test-jwt".into());
        config
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["engage", "issue-token", "--company", "co1", "--user", "u1"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::IssueToken { ref company, ref user } if company == "co1" && user == "u1"
        ));
        assert!(Cli::try_parse_from(["engage", "encrypt"]).is_err());
    }

    #[test]
    fn encrypted_value_opens_with_the_same_key() {
        let config = config();
        let hex = encrypt(&config, "EAAG-token").unwrap();
        let vault = SecretBox::new("cli-test-encryption-key").unwrap();
        assert_eq!(vault.decrypt(&hex), "EAAG-token");
    }

    #[test]
    fn issued_token_carries_the_tenant() {
        let config = config();
        let token = issue_token(&config, "co1", "u1").unwrap();
        let principal = token_authority(&config).unwrap().verify(Some(&token)).unwrap();
        assert_eq!(principal.company_id, "co1");
        assert_eq!(principal.user_id, "u1");
    }

    #[test]
    fn missing_secret_is_a_config_error() {
        let err = encrypt(&EngageConfig::default(), "x").unwrap_err();
        assert_eq!(err.kind(), engage_core::ErrorKind::Config);
        assert!(err.to_string().contains("security.encryption_key"));
    }
}
