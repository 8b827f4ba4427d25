// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks run after deserialization.

use crate::diagnostic::ConfigError;
use crate::model::EngageConfig;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &EngageConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if is_blank(config.security.encryption_key.as_deref()) {
        errors.push(ConfigError::MissingKey {
            key: "security.encryption_key".to_string(),
        });
    }

    if is_blank(config.security.jwt_secret.as_deref()) {
        errors.push(ConfigError::MissingKey {
            key: "security.jwt_secret".to_string(),
        });
    }

    if config.security.token_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "security.token_ttl_secs must be greater than zero".to_string(),
        });
    }

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::Validation {
            message: format!("server.host `{host}` is not a valid IP address or hostname"),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.sessions.auth_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "sessions.auth_dir must not be empty".to_string(),
        });
    }

    if config.sessions.credential_flush_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sessions.credential_flush_secs must be greater than zero".to_string(),
        });
    }

    if !config.whatsapp.api_base_url.starts_with("http://")
        && !config.whatsapp.api_base_url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "whatsapp.api_base_url `{}` must start with http:// or https://",
                config.whatsapp.api_base_url
            ),
        });
    }

    if let Some(endpoint) = &config.ai_agent.endpoint
        && !endpoint.starts_with("http://")
        && !endpoint.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!("ai_agent.endpoint `{endpoint}` must start with http:// or https://"),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
