// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Direct-session protocol port.
//!
//! The multi-device protocol library sits behind [`DirectTransport`]. Opening
//! a connection yields a [`DirectSocket`] handle for commands plus a stream of
//! [`SessionEvent`]s, the only way the protocol reports what happened.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::EngageError;

/// Verbosity handed to the protocol library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolLogLevel {
    Silent,
    Info,
    Debug,
}

/// Negotiated protocol version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion(pub [u32; 3]);

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [major, minor, patch] = self.0;
        write!(f, "{major}.{minor}.{patch}")
    }
}

/// Opaque protocol credential bundle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthState(pub serde_json::Value);

impl AuthState {
    /// Whether the bundle holds nothing yet (never paired).
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// Parameters for opening a protocol connection.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub connection_id: String,
    pub version: ProtocolVersion,
    pub credentials: AuthState,
    pub log_level: ProtocolLogLevel,
}

/// Why the protocol connection closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// The user unlinked the device; credentials are dead.
    LoggedOut,
    ConnectionLost,
    ConnectionReplaced,
    RestartRequired,
    TimedOut,
    Other(u16),
}

impl DisconnectReason {
    /// Classifies the protocol's numeric close code.
    pub fn from_status_code(code: u16) -> Self {
        match code {
            401 => DisconnectReason::LoggedOut,
            408 => DisconnectReason::TimedOut,
            428 => DisconnectReason::ConnectionLost,
            440 => DisconnectReason::ConnectionReplaced,
            515 => DisconnectReason::RestartRequired,
            other => DisconnectReason::Other(other),
        }
    }

    /// Only a logout ends the reconnect loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, DisconnectReason::LoggedOut)
    }
}

/// A message as delivered by the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundProtocolMessage {
    pub id: String,
    /// Protocol address of the chat, e.g. `5511999990000@s.whatsapp.net`.
    pub remote_jid: String,
    pub from_me: bool,
    pub push_name: Option<String>,
    /// Text body; `None` for media and other non-text content.
    pub text: Option<String>,
    pub timestamp: Option<i64>,
}

/// A delivery acknowledgement for a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub message_id: String,
    pub status_code: u8,
}

/// Everything the protocol reports about one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A device-link payload is ready to be shown as a QR code.
    Pairing { qr: String },
    /// The connection is authenticated as `user_id`.
    ConnectionOpen { user_id: String },
    ConnectionClosed { reason: DisconnectReason },
    Messages(Vec<InboundProtocolMessage>),
    StatusUpdates(Vec<StatusUpdate>),
    /// The credential bundle changed and should be persisted.
    CredentialsUpdated(AuthState),
}

/// Command handle of an open protocol connection.
#[async_trait]
pub trait DirectSocket: Send + Sync + 'static {
    /// Sends a text message and returns the provider message id.
    async fn send_text(&self, jid: &str, text: &str) -> Result<String, EngageError>;

    /// Unlinks the device. The event stream ends afterwards.
    async fn logout(&self) -> Result<(), EngageError>;

    /// Snapshot of the current credential bundle.
    fn credentials(&self) -> AuthState;

    /// Closes the socket without unlinking the device.
    async fn close(&self);
}

/// An open connection: command handle plus its event stream.
pub struct OpenedSocket {
    pub socket: Arc<dyn DirectSocket>,
    pub events: mpsc::Receiver<SessionEvent>,
}

impl std::fmt::Debug for OpenedSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedSocket").finish_non_exhaustive()
    }
}

/// Factory for protocol connections.
#[async_trait]
pub trait DirectTransport: Send + Sync + 'static {
    /// Fetches the protocol version to negotiate.
    async fn latest_version(&self) -> Result<ProtocolVersion, EngageError>;

    /// Opens a multiplexed connection with the given credentials.
    async fn open(&self, request: OpenRequest) -> Result<OpenedSocket, EngageError>;
}
