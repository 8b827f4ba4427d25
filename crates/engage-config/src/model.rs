// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the Engage service.
//!
//! Every struct rejects unknown keys so typos surface at startup.

use serde::{Deserialize, Serialize};

/// Top-level Engage configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngageConfig {
    /// HTTP/WebSocket listener and logging.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Encryption and real-time token settings.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Official Cloud API client settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// External AI agent settings.
    #[serde(default)]
    pub ai_agent: AiAgentConfig,

    /// Direct-session manager settings.
    #[serde(default)]
    pub sessions: SessionsConfig,
}

/// Listener and log level.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind host for the real-time gateway.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the real-time gateway.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite database settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable write-ahead logging.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("engage").join("engage.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("engage.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_true() -> bool {
    true
}

/// Key material. Both secrets are required at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Key for the AES-256-GCM secret store.
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// HMAC secret for real-time channel tokens.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued real-time tokens.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            encryption_key: None,
            jwt_secret: None,
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    12 * 60 * 60
}

/// Cloud API client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Graph API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Graph API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v19.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// External AI agent. Routing is disabled while `endpoint` is unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AiAgentConfig {
    /// Chat endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delay between consecutive reply paragraphs.
    #[serde(default = "default_reply_pacing_ms")]
    pub reply_pacing_ms: u64,
}

impl Default for AiAgentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
            reply_pacing_ms: default_reply_pacing_ms(),
        }
    }
}

fn default_reply_pacing_ms() -> u64 {
    1500
}

/// Direct-session manager settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionsConfig {
    /// Root directory for per-connection credential files.
    #[serde(default = "default_auth_dir")]
    pub auth_dir: String,

    /// Delay before reconnecting after a non-terminal disconnect.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Delay between service start and restoring persisted sessions.
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,

    /// Interval between periodic credential flushes to disk.
    #[serde(default = "default_credential_flush_secs")]
    pub credential_flush_secs: u64,

    /// Cancel a pending reconnect when the session is disconnected explicitly.
    #[serde(default)]
    pub cancel_reconnect_on_disconnect: bool,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            auth_dir: default_auth_dir(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            startup_delay_secs: default_startup_delay_secs(),
            credential_flush_secs: default_credential_flush_secs(),
            cancel_reconnect_on_disconnect: false,
        }
    }
}

fn default_auth_dir() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("engage").join("sessions"))
        .unwrap_or_else(|| std::path::PathBuf::from("sessions"))
        .to_string_lossy()
        .into_owned()
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_startup_delay_secs() -> u64 {
    5
}

fn default_credential_flush_secs() -> u64 {
    30
}
