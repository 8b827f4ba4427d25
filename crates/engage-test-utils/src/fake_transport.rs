// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable direct-protocol transport.
//!
//! Each `open` hands back a [`FakeSocket`] and an event stream that tests
//! drive with [`FakeTransport::emit`]. The stream ends when the socket is
//! closed or logged out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use engage_core::traits::transport::{
    AuthState, OpenRequest, OpenedSocket, ProtocolVersion, SessionEvent,
};
use engage_core::{DirectSocket, DirectTransport, EngageError};

const EVENT_BUFFER: usize = 64;

/// Socket double that records sends and lifecycle calls.
pub struct FakeSocket {
    connection_id: String,
    events: std::sync::Mutex<Option<mpsc::Sender<SessionEvent>>>,
    credentials: std::sync::Mutex<AuthState>,
    sent: Mutex<Vec<(String, String)>>,
    fail_sends: AtomicBool,
    logouts: AtomicUsize,
    closes: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeSocket {
    fn new(connection_id: &str, credentials: AuthState, events: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            events: std::sync::Mutex::new(Some(events)),
            credentials: std::sync::Mutex::new(credentials),
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            logouts: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            next_id: AtomicUsize::new(0),
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// `(jid, text)` pairs passed to `send_text`.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Replace the credential snapshot returned by `credentials()`.
    pub fn set_credentials(&self, credentials: AuthState) {
        if let Ok(mut guard) = self.credentials.lock() {
            *guard = credentials;
        }
    }

    fn sender(&self) -> Option<mpsc::Sender<SessionEvent>> {
        self.events.lock().ok().and_then(|guard| guard.clone())
    }

    fn end_stream(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.take();
        }
    }
}

#[async_trait]
impl DirectSocket for FakeSocket {
    async fn send_text(&self, jid: &str, text: &str) -> Result<String, EngageError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(EngageError::protocol("socket write failed"));
        }
        self.sent
            .lock()
            .await
            .push((jid.to_string(), text.to_string()));
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{}-out-{n}", self.connection_id))
    }

    async fn logout(&self) -> Result<(), EngageError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        self.end_stream();
        Ok(())
    }

    fn credentials(&self) -> AuthState {
        self.credentials
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.end_stream();
    }
}

/// Transport double. Counts opens and keeps the latest socket per connection.
#[derive(Default)]
pub struct FakeTransport {
    opens: AtomicUsize,
    fail_open: AtomicBool,
    requests: Mutex<Vec<OpenRequest>>,
    sockets: Mutex<HashMap<String, Arc<FakeSocket>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `open` calls.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Make `open` fail until reset.
    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub async fn requests(&self) -> Vec<OpenRequest> {
        self.requests.lock().await.clone()
    }

    /// The most recently opened socket for `connection_id`.
    pub async fn socket(&self, connection_id: &str) -> Option<Arc<FakeSocket>> {
        self.sockets.lock().await.get(connection_id).cloned()
    }

    /// Push an event into the live stream of `connection_id`.
    ///
    /// Returns `false` if no stream is open.
    pub async fn emit(&self, connection_id: &str, event: SessionEvent) -> bool {
        let Some(sender) = self
            .socket(connection_id)
            .await
            .and_then(|socket| socket.sender())
        else {
            return false;
        };
        sender.send(event).await.is_ok()
    }
}

#[async_trait]
impl DirectTransport for FakeTransport {
    async fn latest_version(&self) -> Result<ProtocolVersion, EngageError> {
        Ok(ProtocolVersion([2, 3000, 1]))
    }

    async fn open(&self, request: OpenRequest) -> Result<OpenedSocket, EngageError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(EngageError::protocol("handshake rejected"));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let socket = Arc::new(FakeSocket::new(
            &request.connection_id,
            request.credentials.clone(),
            tx,
        ));
        self.sockets
            .lock()
            .await
            .insert(request.connection_id.clone(), Arc::clone(&socket));
        self.requests.lock().await.push(request);
        self.opens.fetch_add(1, Ordering::SeqCst);

        Ok(OpenedSocket {
            socket,
            events: rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engage_core::traits::transport::ProtocolLogLevel;

    fn request(id: &str) -> OpenRequest {
        OpenRequest {
            connection_id: id.to_string(),
            version: ProtocolVersion([2, 3000, 1]),
            credentials: AuthState::default(),
            log_level: ProtocolLogLevel::Silent,
        }
    }

    #[tokio::test]
    async fn emitted_events_reach_the_stream_until_close() {
        let transport = FakeTransport::new();
        let mut opened = transport.open(request("c1")).await.unwrap();

        assert!(
            transport
                .emit("c1", SessionEvent::Pairing { qr: "ref".into() })
                .await
        );
        assert_eq!(
            opened.events.recv().await,
            Some(SessionEvent::Pairing { qr: "ref".into() })
        );

        opened.socket.close().await;
        assert!(!transport.emit("c1", SessionEvent::Messages(vec![])).await);
        assert_eq!(opened.events.recv().await, None);
        assert_eq!(transport.opens(), 1);
    }

    #[tokio::test]
    async fn failing_open_is_not_counted() {
        let transport = FakeTransport::new();
        transport.fail_open(true);
        assert!(transport.open(request("c1")).await.is_err());
        assert_eq!(transport.opens(), 0);
    }
}
