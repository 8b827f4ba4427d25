// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `engage serve`: composition root and process lifecycle.

use std::sync::Arc;
use std::time::Duration;

use engage_automation::{HttpAgentClient, TriggerEngine};
use engage_config::EngageConfig;
use engage_core::{AiAgent, CrmStore, EngageError};
use engage_gateway::{GatewayState, RoomHub, start_server};
use engage_session::{FileAuthStore, SessionManager, SessionSettings};
use engage_storage::SqliteStore;
use engage_vault::SecretBox;
use engage_whatsapp::CloudApiClient;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::dispatch::spawn_trigger_dispatcher;
use crate::outbound::ChannelRouter;
use crate::shutdown::install_signal_handler;
use crate::transport::UnlinkedTransport;
use crate::{required, token_authority};

const TRIGGER_QUEUE: usize = 256;

/// Log targets raised to the configured level; everything else stays at `warn`.
const LOG_TARGETS: [&str; 10] = [
    "engage",
    "engage_automation",
    "engage_config",
    "engage_core",
    "engage_gateway",
    "engage_security",
    "engage_session",
    "engage_storage",
    "engage_vault",
    "engage_whatsapp",
];

pub async fn run_serve(config: EngageConfig) -> Result<(), EngageError> {
    init_tracing(&config.server.log_level);

    let vault = SecretBox::new(required(
        &config.security.encryption_key,
        "security.encryption_key",
    )?)?;
    let tokens = Arc::new(token_authority(&config)?);

    let store: Arc<dyn CrmStore> = Arc::new(SqliteStore::open(&config.storage).await?);
    let hub = Arc::new(RoomHub::new());

    let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_QUEUE);
    let sessions = SessionManager::new(
        store.clone(),
        Arc::new(UnlinkedTransport),
        hub.clone(),
        vault.clone(),
        FileAuthStore::new(&config.sessions.auth_dir),
        SessionSettings::from_config(&config.sessions),
        trigger_tx,
    );

    let cloud = Arc::new(CloudApiClient::new(
        &config.whatsapp,
        store.clone(),
        vault.clone(),
    )?);
    let router = Arc::new(ChannelRouter::new(store.clone(), cloud, sessions.clone()));

    let agent = HttpAgentClient::from_config(&config.ai_agent)?
        .map(|client| Arc::new(client) as Arc<dyn AiAgent>);
    if agent.is_none() {
        info!("no AI agent endpoint configured, AI routing disabled");
    }
    let engine = TriggerEngine::new(
        store.clone(),
        router,
        agent,
        Duration::from_millis(config.ai_agent.reply_pacing_ms),
    );
    let dispatcher = spawn_trigger_dispatcher(engine, trigger_rx);

    let shutdown = install_signal_handler();
    schedule_startup_reconnect(
        sessions.clone(),
        Duration::from_secs(config.sessions.startup_delay_secs),
        shutdown.clone(),
    );

    let state = GatewayState {
        hub,
        sessions: sessions.clone(),
        store,
        tokens,
    };
    let result = start_server(&config.server, state, shutdown.clone()).await;

    shutdown.cancel();
    sessions.shutdown().await;
    dispatcher.abort();
    info!("engage stopped");
    result
}

/// Restores the active direct sessions once the process has settled.
fn schedule_startup_reconnect(
    sessions: SessionManager,
    delay: Duration,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::time::sleep(delay) => match sessions.reconnect_all_sessions().await {
                Ok(count) => info!(count, "startup reconnect finished"),
                Err(e) => error!(error = %e, "startup reconnect failed"),
            },
        }
    });
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

fn default_directives(log_level: &str) -> String {
    let mut directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={log_level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_workspace_crate_gets_the_configured_level() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("engage=debug,engage_automation=debug"));
        assert!(directives.contains("engage_session=debug"));
        assert!(directives.ends_with(",warn"));
    }
}
