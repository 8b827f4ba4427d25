// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based loader.
//!
//! Lookup order: `/etc/engage/engage.toml`, `~/.config/engage/engage.toml`,
//! `./engage.toml`, then `ENGAGE_*` environment variables.

#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::EngageConfig;

/// Section names recognised when mapping environment variables.
const SECTIONS: &[&str] = &[
    "server",
    "storage",
    "security",
    "whatsapp",
    "ai_agent",
    "sessions",
];

/// System-wide config path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/engage/engage.toml";

/// Local config file name.
pub const LOCAL_CONFIG_FILE: &str = "engage.toml";

/// Per-user config path under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("engage").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env overrides.
pub fn load_config() -> Result<EngageConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string, without env overrides.
pub fn load_config_from_str(toml_content: &str) -> Result<EngageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EngageConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file, then env overrides.
pub fn load_config_from_path(path: &Path) -> Result<EngageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EngageConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(EngageConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Maps a lowercased, prefix-stripped env var name onto a dotted key.
///
/// `security_encryption_key` becomes `security.encryption_key` and
/// `ai_agent_endpoint` becomes `ai_agent.endpoint`. Only the section prefix is
/// split so key names keep their underscores.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
            && !rest.is_empty()
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("ENGAGE_").map(|key| map_env_key(key.as_str()).into())
}
