// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of live direct sessions and their public operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use engage_config::model::SessionsConfig;
use engage_core::traits::transport::{AuthState, OpenRequest, OpenedSocket, ProtocolLogLevel};
use engage_core::types::TriggerRequest;
use engage_core::{
    CrmStore, DirectSocket, DirectTransport, EngageError, ErrorKind, RealtimePublisher,
};
use engage_vault::SecretBox;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::auth_state::FileAuthStore;
use crate::jid::to_jid;
use crate::reconnect::ReconnectHandle;
use crate::state::SessionState;

/// Timing and policy knobs of the manager.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub reconnect_delay: Duration,
    pub credential_flush: Duration,
    /// Whether `disconnect_session` cancels a pending reconnect.
    pub cancel_reconnect_on_disconnect: bool,
}

impl SessionSettings {
    pub fn from_config(config: &SessionsConfig) -> Self {
        Self {
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            credential_flush: Duration::from_secs(config.credential_flush_secs),
            cancel_reconnect_on_disconnect: config.cancel_reconnect_on_disconnect,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            credential_flush: Duration::from_secs(30),
            cancel_reconnect_on_disconnect: false,
        }
    }
}

/// Tagged result of [`SessionManager::send_message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl SendOutcome {
    fn sent(message_id: String) -> Self {
        Self {
            success: true,
            message_id: Some(message_id),
            error: None,
            error_kind: None,
        }
    }

    fn failed(error: &EngageError) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }
}

/// Answer of [`SessionManager::get_status`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_connected: bool,
    pub phone_number: Option<String>,
    pub last_connected_at: Option<String>,
}

/// A tracked protocol connection.
#[derive(Clone)]
pub(crate) struct LiveSession {
    pub(crate) generation: u64,
    pub(crate) company_id: String,
    pub(crate) socket: Arc<dyn DirectSocket>,
    pub(crate) phone_number: Option<String>,
    pub(crate) last_connected_at: Option<String>,
    /// Stops the session's event loop and flush timer.
    pub(crate) stop: CancellationToken,
}

pub(crate) struct Inner {
    pub(crate) store: Arc<dyn CrmStore>,
    pub(crate) transport: Arc<dyn DirectTransport>,
    pub(crate) publisher: Arc<dyn RealtimePublisher>,
    pub(crate) vault: SecretBox,
    pub(crate) auth: FileAuthStore,
    pub(crate) settings: SessionSettings,
    pub(crate) triggers: mpsc::Sender<TriggerRequest>,
    pub(crate) sessions: DashMap<String, LiveSession>,
    connecting: DashMap<String, ()>,
    pub(crate) states: DashMap<String, SessionState>,
    pub(crate) reconnects: DashMap<String, ReconnectHandle>,
    generation: AtomicU64,
    pub(crate) shutdown: CancellationToken,
}

/// Owns one protocol connection per direct-session `Connection`.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct SessionManager {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("live_sessions", &self.inner.sessions.len())
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn CrmStore>,
        transport: Arc<dyn DirectTransport>,
        publisher: Arc<dyn RealtimePublisher>,
        vault: SecretBox,
        auth: FileAuthStore,
        settings: SessionSettings,
        triggers: mpsc::Sender<TriggerRequest>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                publisher,
                vault,
                auth,
                settings,
                triggers,
                sessions: DashMap::new(),
                connecting: DashMap::new(),
                states: DashMap::new(),
                reconnects: DashMap::new(),
                generation: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Opens the protocol connection for `connection_id`.
    ///
    /// Returns immediately when the connection is already tracked or being
    /// opened. Setup failures (credential directory, version negotiation,
    /// handshake) are returned to the caller.
    pub async fn connect_session(
        &self,
        connection_id: &str,
        company_id: &str,
    ) -> Result<(), EngageError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(EngageError::protocol("session manager is shut down"));
        }
        if self
            .inner
            .connecting
            .insert(connection_id.to_string(), ())
            .is_some()
        {
            debug!(connection_id, "connect already in progress");
            return Ok(());
        }
        if self.inner.sessions.contains_key(connection_id) {
            self.inner.connecting.remove(connection_id);
            debug!(connection_id, "session already tracked");
            return Ok(());
        }

        let result = self.open_session(connection_id, company_id).await;
        self.inner.connecting.remove(connection_id);
        result
    }

    async fn open_session(&self, connection_id: &str, company_id: &str) -> Result<(), EngageError> {
        self.set_state(connection_id, SessionState::Initializing);
        self.inner.auth.ensure_dir(connection_id).await?;
        let credentials = self.load_credentials(connection_id).await?;
        let paired = !credentials.is_empty();

        let version = self.inner.transport.latest_version().await?;
        info!(connection_id, %version, paired, "opening direct session");

        let OpenedSocket { socket, events } = self
            .inner
            .transport
            .open(OpenRequest {
                connection_id: connection_id.to_string(),
                version,
                credentials,
                log_level: ProtocolLogLevel::Silent,
            })
            .await?;

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let stop = self.inner.shutdown.child_token();
        self.inner.sessions.insert(
            connection_id.to_string(),
            LiveSession {
                generation,
                company_id: company_id.to_string(),
                socket: Arc::clone(&socket),
                phone_number: None,
                last_connected_at: None,
                stop: stop.clone(),
            },
        );

        tokio::spawn(self.clone().run_session(
            crate::events::SessionCtx {
                connection_id: connection_id.to_string(),
                company_id: company_id.to_string(),
                generation,
                socket,
            },
            events,
            stop,
        ));
        Ok(())
    }

    /// Credentials from disk, else the encrypted copy on the session row.
    async fn load_credentials(&self, connection_id: &str) -> Result<AuthState, EngageError> {
        let from_disk = self.inner.auth.load(connection_id).await?;
        if !from_disk.is_empty() {
            return Ok(from_disk);
        }

        let sealed = match self.inner.store.get_direct_session(connection_id).await {
            Ok(row) => row.and_then(|r| r.session_data),
            Err(e) => {
                warn!(connection_id, error = %e, "cannot read stored session; starting unpaired");
                None
            }
        };
        let Some(sealed) = sealed else {
            return Ok(AuthState::default());
        };

        let restored = self
            .inner
            .vault
            .try_decrypt(&sealed)
            .and_then(|plain| {
                serde_json::from_str::<AuthState>(&plain)
                    .map_err(|e| EngageError::Crypto(format!("stored session is not JSON: {e}")))
            });
        match restored {
            Ok(state) => {
                debug!(connection_id, "restored credentials from session row");
                Ok(state)
            }
            Err(e) => {
                warn!(connection_id, error = %e, "stored session unusable; starting unpaired");
                Ok(AuthState::default())
            }
        }
    }

    /// Sends a text through the live session.
    ///
    /// Never fails; errors are reported in the outcome.
    pub async fn send_message(
        &self,
        connection_id: &str,
        destination: &str,
        content: &str,
    ) -> SendOutcome {
        match self.try_send_message(connection_id, destination, content).await {
            Ok(message_id) => SendOutcome::sent(message_id),
            Err(e) => {
                warn!(connection_id, error = %e, "direct send failed");
                SendOutcome::failed(&e)
            }
        }
    }

    /// Like [`send_message`](Self::send_message) but returns the error.
    pub async fn try_send_message(
        &self,
        connection_id: &str,
        destination: &str,
        content: &str,
    ) -> Result<String, EngageError> {
        let socket = self
            .inner
            .sessions
            .get(connection_id)
            .map(|s| Arc::clone(&s.socket))
            .ok_or_else(|| EngageError::SessionNotFound {
                connection_id: connection_id.to_string(),
            })?;
        socket.send_text(&to_jid(destination), content).await
    }

    /// Live status, or the last persisted one when no session is tracked.
    pub async fn get_status(&self, connection_id: &str) -> Result<SessionStatus, EngageError> {
        if let Some(live) = self.inner.sessions.get(connection_id).map(|s| s.value().clone()) {
            return Ok(SessionStatus {
                is_connected: true,
                phone_number: live.phone_number,
                last_connected_at: live.last_connected_at,
            });
        }

        Ok(self
            .inner
            .store
            .get_direct_session(connection_id)
            .await?
            .map(|row| SessionStatus {
                is_connected: false,
                phone_number: row.phone_number,
                last_connected_at: row.last_connected_at,
            })
            .unwrap_or_default())
    }

    /// Logs the live session out, then deactivates the stored session and
    /// deletes its credential directory.
    pub async fn disconnect_session(&self, connection_id: &str) -> Result<(), EngageError> {
        if self.inner.settings.cancel_reconnect_on_disconnect && self.cancel_reconnect(connection_id)
        {
            info!(connection_id, "pending reconnect cancelled by disconnect");
        }

        let live = self.inner.sessions.remove(connection_id).map(|(_, s)| s);
        let company_id = match &live {
            Some(session) => Some(session.company_id.clone()),
            None => self
                .inner
                .store
                .get_connection(connection_id)
                .await?
                .map(|c| c.company_id),
        };

        if let Some(session) = live {
            session.stop.cancel();
            if let Err(e) = session.socket.logout().await {
                warn!(connection_id, error = %e, "logout failed; continuing cleanup");
            }
        }

        info!(connection_id, "direct session disconnected");
        self.cleanup(connection_id, company_id.as_deref()).await
    }

    /// Deactivates the stored session, removes credentials and notifies the
    /// tenant. Only the deactivation can fail.
    pub(crate) async fn cleanup(
        &self,
        connection_id: &str,
        company_id: Option<&str>,
    ) -> Result<(), EngageError> {
        self.set_state(connection_id, SessionState::LoggedOut);
        let deactivated = self
            .inner
            .store
            .set_direct_session_active(connection_id, false)
            .await;
        if let Err(e) = self
            .inner
            .store
            .set_connection_active(connection_id, false)
            .await
        {
            warn!(connection_id, error = %e, "failed to mark connection inactive");
        }
        if let Err(e) = self.inner.auth.remove(connection_id).await {
            warn!(connection_id, error = %e, "failed to delete credential directory");
        }
        if let Some(company_id) = company_id {
            self.emit(
                company_id,
                &format!("disconnected:{connection_id}"),
                serde_json::json!({ "connectionId": connection_id }),
            )
            .await;
        }
        deactivated
    }

    /// Reopens every session flagged active, one after another.
    ///
    /// Returns how many connected. Individual failures are logged.
    pub async fn reconnect_all_sessions(&self) -> Result<usize, EngageError> {
        let active = self.inner.store.list_active_direct_sessions().await?;
        info!(count = active.len(), "reconnecting stored direct sessions");

        let mut connected = 0;
        for session in active {
            match self
                .connect_session(&session.connection_id, &session.company_id)
                .await
            {
                Ok(()) => connected += 1,
                Err(e) => error!(
                    connection_id = %session.connection_id,
                    error = %e,
                    "failed to restore direct session"
                ),
            }
        }
        Ok(connected)
    }

    /// Cancels every pending reconnect and flush timer and closes every live
    /// socket. Devices stay linked.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        for entry in self.inner.reconnects.iter() {
            entry.value().cancel();
        }
        self.inner.reconnects.clear();

        let ids: Vec<String> = self
            .inner
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let mut closed = 0usize;
        for id in ids {
            let Some((_, session)) = self.inner.sessions.remove(&id) else {
                continue;
            };
            session.stop.cancel();
            self.flush_credentials(&id, session.socket.as_ref()).await;
            session.socket.close().await;
            closed += 1;
        }
        info!(closed, "session manager shut down");
    }

    /// Lifecycle state of a connection seen by this process.
    pub fn session_state(&self, connection_id: &str) -> Option<SessionState> {
        self.inner.states.get(connection_id).map(|s| *s)
    }

    pub fn has_pending_reconnect(&self, connection_id: &str) -> bool {
        self.inner
            .reconnects
            .get(connection_id)
            .is_some_and(|handle| handle.is_pending())
    }

    /// Cancels a scheduled reconnect. Returns whether one was pending.
    pub fn cancel_reconnect(&self, connection_id: &str) -> bool {
        match self.inner.reconnects.remove(connection_id) {
            Some((_, handle)) => {
                let pending = handle.is_pending();
                handle.cancel();
                pending
            }
            None => false,
        }
    }

    pub fn live_session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    pub fn is_live(&self, connection_id: &str) -> bool {
        self.inner.sessions.contains_key(connection_id)
    }

    pub(crate) fn set_state(&self, connection_id: &str, state: SessionState) {
        debug!(connection_id, %state, "session state changed");
        self.inner.states.insert(connection_id.to_string(), state);
    }

    /// Schedules `connect_session` after the reconnect delay, replacing any
    /// earlier pending reconnect for the connection.
    pub(crate) fn schedule_reconnect(&self, connection_id: &str, company_id: &str) {
        let manager = self.clone();
        let id = connection_id.to_string();
        let company = company_id.to_string();
        let handle = ReconnectHandle::schedule(self.inner.settings.reconnect_delay, async move {
            if let Err(e) = manager.connect_session(&id, &company).await {
                error!(connection_id = %id, error = %e, "reconnect failed");
            }
        });
        if let Some(previous) = self
            .inner
            .reconnects
            .insert(connection_id.to_string(), handle)
        {
            previous.cancel();
        }
    }

    pub(crate) async fn flush_credentials(&self, connection_id: &str, socket: &dyn DirectSocket) {
        let credentials = socket.credentials();
        if credentials.is_empty() {
            return;
        }
        if let Err(e) = self.inner.auth.save(connection_id, &credentials).await {
            warn!(connection_id, error = %e, "credential flush failed");
        }
    }

    pub(crate) async fn emit(&self, company_id: &str, event: &str, payload: serde_json::Value) {
        let room = engage_core::company_room(company_id);
        let reached = self.inner.publisher.emit_to_room(&room, event, payload).await;
        debug!(%room, event, reached, "realtime event pushed");
    }
}
