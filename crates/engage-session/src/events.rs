// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session event loop and the dispatch of protocol events.

use std::sync::Arc;

use engage_core::traits::transport::{
    DisconnectReason, InboundProtocolMessage, SessionEvent, StatusUpdate,
};
use engage_core::types::{
    DirectSession, MessageStatus, NewMessage, SenderType, TriggerRequest, timestamp_now,
};
use engage_core::{DirectSocket, EngageError};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::jid::phone_from_jid;
use crate::manager::SessionManager;
use crate::qr::qr_data_uri;
use crate::state::SessionState;

/// Identity of the session an event loop serves.
pub(crate) struct SessionCtx {
    pub(crate) connection_id: String,
    pub(crate) company_id: String,
    pub(crate) generation: u64,
    pub(crate) socket: Arc<dyn DirectSocket>,
}

/// Whether the event loop keeps running after an event.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

impl SessionManager {
    pub(crate) async fn run_session(
        self,
        ctx: SessionCtx,
        mut events: mpsc::Receiver<SessionEvent>,
        stop: CancellationToken,
    ) {
        let period = self.inner.settings.credential_flush;
        let mut flush = tokio::time::interval_at(Instant::now() + period, period);
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stop.cancelled() => {
                    debug!(connection_id = %ctx.connection_id, "session loop stopped");
                    break;
                }
                _ = flush.tick() => {
                    self.flush_credentials(&ctx.connection_id, ctx.socket.as_ref()).await;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        if stop.is_cancelled() {
                            debug!(connection_id = %ctx.connection_id, "event stream ended");
                        } else {
                            warn!(connection_id = %ctx.connection_id, "event stream ended without a close event");
                            self.on_closed(&ctx, DisconnectReason::ConnectionLost).await;
                        }
                        break;
                    };
                    if self.dispatch(&ctx, event).await == Flow::Stop {
                        break;
                    }
                }
            }
        }
    }

    async fn dispatch(&self, ctx: &SessionCtx, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::Pairing { qr } => {
                self.on_pairing(ctx, &qr).await;
                Flow::Continue
            }
            SessionEvent::ConnectionOpen { user_id } => {
                self.on_open(ctx, &user_id).await;
                Flow::Continue
            }
            SessionEvent::ConnectionClosed { reason } => {
                self.on_closed(ctx, reason).await;
                Flow::Stop
            }
            SessionEvent::Messages(batch) => {
                for message in &batch {
                    if let Err(e) = self.on_inbound(ctx, message).await {
                        warn!(
                            connection_id = %ctx.connection_id,
                            message_id = %message.id,
                            error = %e,
                            "failed to store inbound message"
                        );
                    }
                }
                Flow::Continue
            }
            SessionEvent::StatusUpdates(updates) => {
                for update in &updates {
                    self.on_status(ctx, update).await;
                }
                Flow::Continue
            }
            SessionEvent::CredentialsUpdated(state) => {
                if let Err(e) = self.inner.auth.save(&ctx.connection_id, &state).await {
                    warn!(connection_id = %ctx.connection_id, error = %e, "failed to persist credentials");
                }
                Flow::Continue
            }
        }
    }

    async fn on_pairing(&self, ctx: &SessionCtx, qr: &str) {
        self.set_state(&ctx.connection_id, SessionState::AwaitingPairing);
        let image = match qr_data_uri(qr) {
            Ok(image) => image,
            Err(e) => {
                warn!(connection_id = %ctx.connection_id, error = %e, "cannot render pairing code");
                return;
            }
        };
        info!(connection_id = %ctx.connection_id, "pairing code ready");

        let payload = json!({ "connectionId": ctx.connection_id, "qr": image });
        self.emit(
            &ctx.company_id,
            &format!("pairing:{}", ctx.connection_id),
            payload.clone(),
        )
        .await;
        self.emit(&ctx.company_id, "pairing", payload).await;
    }

    async fn on_open(&self, ctx: &SessionCtx, user_id: &str) {
        let phone = phone_from_jid(user_id);
        let now = timestamp_now();

        let credentials = ctx.socket.credentials();
        let session_data = if credentials.is_empty() {
            None
        } else {
            match serde_json::to_string(&credentials)
                .map_err(|e| EngageError::Crypto(e.to_string()))
                .and_then(|plain| self.inner.vault.encrypt(&plain))
            {
                Ok(sealed) => Some(sealed),
                Err(e) => {
                    warn!(connection_id = %ctx.connection_id, error = %e, "cannot seal session credentials");
                    None
                }
            }
        };

        let row = DirectSession {
            connection_id: ctx.connection_id.clone(),
            session_data,
            phone_number: Some(phone.clone()),
            is_active: true,
            last_connected_at: Some(now.clone()),
            updated_at: now.clone(),
        };
        if let Err(e) = self.inner.store.save_direct_session(&row).await {
            warn!(connection_id = %ctx.connection_id, error = %e, "failed to persist direct session");
        }
        if let Err(e) = self
            .inner
            .store
            .set_connection_active(&ctx.connection_id, true)
            .await
        {
            warn!(connection_id = %ctx.connection_id, error = %e, "failed to mark connection active");
        }

        if let Some(mut live) = self.inner.sessions.get_mut(&ctx.connection_id)
            && live.generation == ctx.generation
        {
            live.phone_number = Some(phone.clone());
            live.last_connected_at = Some(now);
        }
        info!(connection_id = %ctx.connection_id, "direct session connected");

        self.emit(
            &ctx.company_id,
            &format!("connected:{}", ctx.connection_id),
            json!({ "connectionId": ctx.connection_id, "phoneNumber": phone }),
        )
        .await;
        self.set_state(&ctx.connection_id, SessionState::Connected);
    }

    async fn on_closed(&self, ctx: &SessionCtx, reason: DisconnectReason) {
        let released = self
            .inner
            .sessions
            .remove_if(&ctx.connection_id, |_, s| s.generation == ctx.generation)
            .is_some();
        ctx.socket.close().await;

        if !released {
            debug!(connection_id = %ctx.connection_id, ?reason, "close for a session no longer tracked");
            return;
        }

        if reason.is_terminal() {
            info!(connection_id = %ctx.connection_id, "device logged out; cleaning up");
            if let Err(e) = self
                .cleanup(&ctx.connection_id, Some(&ctx.company_id))
                .await
            {
                warn!(connection_id = %ctx.connection_id, error = %e, "failed to deactivate direct session");
            }
            return;
        }

        if self.inner.shutdown.is_cancelled() {
            return;
        }
        warn!(
            connection_id = %ctx.connection_id,
            ?reason,
            delay_secs = self.inner.settings.reconnect_delay.as_secs(),
            "direct session closed; reconnect scheduled"
        );
        self.set_state(&ctx.connection_id, SessionState::Reconnecting);
        self.schedule_reconnect(&ctx.connection_id, &ctx.company_id);
    }

    async fn on_inbound(
        &self,
        ctx: &SessionCtx,
        message: &InboundProtocolMessage,
    ) -> Result<(), EngageError> {
        if message.from_me {
            return Ok(());
        }
        let Some(text) = message.text.as_deref().filter(|t| !t.is_empty()) else {
            debug!(connection_id = %ctx.connection_id, message_id = %message.id, "skipping non-text message");
            return Ok(());
        };

        let store = &self.inner.store;
        let phone = phone_from_jid(&message.remote_jid);
        let contact = store
            .find_or_create_contact(&ctx.company_id, &phone, message.push_name.as_deref())
            .await?;
        let conversation = store
            .find_or_create_conversation(&ctx.company_id, &contact.id, &ctx.connection_id)
            .await?;
        let stored = store
            .insert_message(&NewMessage {
                conversation_id: conversation.id.clone(),
                sender_type: SenderType::Contact,
                content: text.to_string(),
                status: MessageStatus::Received,
                provider_message_id: Some(message.id.clone()),
            })
            .await?;
        store
            .touch_conversation(&conversation.id, &stored.created_at)
            .await?;

        let request = TriggerRequest {
            conversation_id: conversation.id.clone(),
            message_id: stored.id.clone(),
        };
        if self.inner.triggers.send(request).await.is_err() {
            warn!(connection_id = %ctx.connection_id, "trigger dispatcher is gone; automation skipped");
        }

        self.emit(
            &ctx.company_id,
            "message:new",
            json!({
                "connectionId": ctx.connection_id,
                "conversationId": conversation.id,
                "messageId": stored.id,
            }),
        )
        .await;
        Ok(())
    }

    async fn on_status(&self, ctx: &SessionCtx, update: &StatusUpdate) {
        let Some(status) = MessageStatus::from_protocol_code(update.status_code) else {
            debug!(code = update.status_code, "unmapped status code ignored");
            return;
        };
        match self
            .inner
            .store
            .update_message_status(&update.message_id, status)
            .await
        {
            Ok(true) => debug!(message_id = %update.message_id, %status, "message status updated"),
            Ok(false) => debug!(message_id = %update.message_id, %status, "status update not applied"),
            Err(e) => warn!(
                connection_id = %ctx.connection_id,
                message_id = %update.message_id,
                error = %e,
                "failed to update message status"
            ),
        }
    }
}
