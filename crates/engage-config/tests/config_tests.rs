// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Engage configuration system.

use engage_config::diagnostic::ConfigError;
use engage_config::model::EngageConfig;
use engage_config::{load_and_validate_str, load_config_from_str};

const SECRETS: &str = r#"
[security]
encryption_key = "0123456789abcdef0123456789abcdef"
jwt_secret = "realtime-secret"
"#;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"

[storage]
database_path = "/tmp/engage-test.db"
wal_mode = false

[security]
encryption_key = "k"
jwt_secret = "j"
token_ttl_secs = 60

[whatsapp]
api_base_url = "http://localhost:9000"
api_version = "v20.0"
request_timeout_secs = 5

[ai_agent]
endpoint = "http://agent.local/chat"
reply_pacing_ms = 10

[sessions]
auth_dir = "/tmp/auth"
reconnect_delay_secs = 1
startup_delay_secs = 0
credential_flush_secs = 2
cancel_reconnect_on_disconnect = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/engage-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.security.token_ttl_secs, 60);
    assert_eq!(config.whatsapp.api_version, "v20.0");
    assert_eq!(
        config.ai_agent.endpoint.as_deref(),
        Some("http://agent.local/chat")
    );
    assert_eq!(config.ai_agent.reply_pacing_ms, 10);
    assert_eq!(config.sessions.reconnect_delay_secs, 1);
    assert!(config.sessions.cancel_reconnect_on_disconnect);
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.server.port, 3001);
    assert_eq!(config.server.log_level, "info");
    assert!(config.storage.wal_mode);
    assert_eq!(config.whatsapp.api_base_url, "https://graph.facebook.com");
    assert_eq!(config.whatsapp.api_version, "v19.0");
    assert!(config.ai_agent.endpoint.is_none());
    assert_eq!(config.ai_agent.reply_pacing_ms, 1500);
    assert_eq!(config.sessions.reconnect_delay_secs, 5);
    assert!(!config.sessions.cancel_reconnect_on_disconnect);
    assert!(config.security.encryption_key.is_none());
}

#[test]
fn env_style_override_wins_over_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: EngageConfig = Figment::new()
        .merge(Serialized::defaults(EngageConfig::default()))
        .merge(Toml::string("[ai_agent]\nendpoint = \"http://from-toml\"\n"))
        .merge(("ai_agent.endpoint", "http://from-env"))
        .extract()
        .expect("should merge override");

    assert_eq!(config.ai_agent.endpoint.as_deref(), Some("http://from-env"));
}

#[test]
fn missing_secrets_are_fatal() {
    let errors = load_and_validate_str("").expect_err("secrets are required");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::MissingKey { key } if key == "security.encryption_key")
    ));
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key == "security.jwt_secret"))
    );
}

#[test]
fn secrets_present_validates() {
    let config = load_and_validate_str(SECRETS).expect("should validate");
    assert_eq!(config.security.jwt_secret.as_deref(), Some("realtime-secret"));
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = "[sessions]\nreconect_delay_secs = 3\n";

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "reconect_delay_secs"
                && suggestion.as_deref() == Some("reconnect_delay_secs")
                && valid_keys.contains("auth_dir")
        })
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = "[telegram]\nbot_token = \"x\"\n";
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn invalid_type_is_reported() {
    let toml = "[server]\nport = \"not a number\"\n";
    let err = load_config_from_str(toml).expect_err("should reject type");
    let err_str = err.to_string();
    assert!(
        err_str.contains("invalid type") || err_str.contains("port"),
        "got: {err_str}"
    );

    let errors = load_and_validate_str(toml).expect_err("should reject type");
    assert!(!errors.is_empty());
}

#[test]
fn config_error_renders_with_miette() {
    use miette::Diagnostic;

    let err = ConfigError::MissingKey {
        key: "security.jwt_secret".to_string(),
    };
    assert!(err.code().is_some());
    assert!(err.help().is_some());
    assert!(err.to_string().contains("security.jwt_secret"));
}
