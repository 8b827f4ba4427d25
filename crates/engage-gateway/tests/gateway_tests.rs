// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway routes and socket rooms, over HTTP and real sockets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use engage_core::traits::transport::SessionEvent;
use engage_core::types::ProtocolMode;
use engage_core::{CrmStore, RealtimePublisher, company_room};
use engage_gateway::{GatewayState, RoomHub, TokenAuthority, router, serve};
use engage_session::{FileAuthStore, SessionManager, SessionSettings};
use engage_test_utils::{FakeTransport, MemoryStore, fixtures};
use engage_vault::SecretBox;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Harness {
    state: GatewayState,
    transport: Arc<FakeTransport>,
    _auth_dir: TempDir,
}

async fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.insert_company(&fixtures::company("co1")).await.unwrap();
    store.insert_company(&fixtures::company("co2")).await.unwrap();
    for (id, company, mode) in [
        ("conn1", "co1", ProtocolMode::DirectSession),
        ("conn2", "co2", ProtocolMode::DirectSession),
        ("api1", "co1", ProtocolMode::OfficialApi),
    ] {
        store
            .insert_connection(&fixtures::connection(id, company, mode))
            .await
            .unwrap();
    }

    let auth_dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let hub = Arc::new(RoomHub::new());
    let (triggers, _) = mpsc::channel(16);
    let sessions = SessionManager::new(
        store.clone(),
        transport.clone(),
        hub.clone(),
        SecretBox::new("gateway-test-key").unwrap(),
        FileAuthStore::new(auth_dir.path()),
        SessionSettings::default(),
        triggers,
    );

    Harness {
        state: GatewayState {
            hub,
            sessions,
            store,
            tokens: Arc::new(
                TokenAuthority::new("gateway-secret", Duration::from_secs(3600)).unwrap(),
            ),
        },
        transport,
        _auth_dir: auth_dir,
    }
}

impl Harness {
    async fn spawn(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = self.state.clone();
        tokio::spawn(async move { serve(listener, state, CancellationToken::new()).await });
        addr
    }

    async fn client(&self, addr: SocketAddr, company: &str) -> Client {
        let token = self.state.tokens.issue("user-1", company).unwrap();
        let room = company_room(company);
        let before = self.state.hub.member_count(&room);
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?token={token}"))
            .await
            .unwrap();
        for _ in 0..200 {
            if self.state.hub.member_count(&room) > before {
                return ws;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("socket never joined {room}");
    }
}

async fn recv(ws: &mut Client) -> Option<Value> {
    loop {
        let next = tokio::time::timeout(Duration::from_millis(500), ws.next()).await;
        match next {
            Ok(Some(Ok(Message::Text(text)))) => {
                return Some(serde_json::from_str(text.as_str()).unwrap());
            }
            Ok(Some(Ok(_))) => continue,
            _ => return None,
        }
    }
}

async fn recv_event(ws: &mut Client, event: &str) -> Value {
    while let Some(frame) = recv(ws).await {
        if frame["event"] == event {
            return frame["data"].clone();
        }
    }
    panic!("no {event} frame received");
}

async fn command(ws: &mut Client, event: &str, data: Value) -> Value {
    ws.send(Message::text(json!({ "event": event, "data": data }).to_string()))
        .await
        .unwrap();
    recv_event(ws, &format!("{event}:result")).await
}

#[tokio::test]
async fn health_reports_live_sessions() {
    let h = harness().await;
    let response = router(h.state.clone())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "status": "ok", "live_sessions": 0 }));
}

#[tokio::test]
async fn handshake_without_valid_token_is_unauthorized() {
    let h = harness().await;
    let foreign = TokenAuthority::new("other-secret", Duration::from_secs(60))
        .unwrap()
        .issue("user-1", "co1")
        .unwrap();

    for uri in [
        "/ws".to_string(),
        "/ws?token=".to_string(),
        "/ws?token=garbage".to_string(),
        format!("/ws?token={foreign}"),
    ] {
        let response = router(h.state.clone())
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn rejected_socket_upgrade_fails_to_connect() {
    let h = harness().await;
    let addr = h.spawn().await;
    let result = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?token=nope")).await;
    assert!(result.is_err());
    assert_eq!(h.state.hub.member_count("company:co1"), 0);
}

#[tokio::test]
async fn pushes_reach_only_the_tenant_room() {
    let h = harness().await;
    let addr = h.spawn().await;
    let mut co1 = h.client(addr, "co1").await;
    let mut co2 = h.client(addr, "co2").await;

    let reached = h
        .state
        .hub
        .emit_to_room("company:co1", "message:new", json!({ "conversationId": "cv1" }))
        .await;

    assert_eq!(reached, 1);
    let frame = recv(&mut co1).await.unwrap();
    assert_eq!(frame["event"], "message:new");
    assert_eq!(frame["data"]["conversationId"], "cv1");
    assert!(recv(&mut co2).await.is_none());
}

#[tokio::test]
async fn connect_command_streams_pairing_code_to_the_room() {
    let h = harness().await;
    let addr = h.spawn().await;
    let mut ws = h.client(addr, "co1").await;

    let result = command(&mut ws, "session:connect", json!({ "connectionId": "conn1" })).await;
    assert_eq!(result["success"], true);
    assert_eq!(h.transport.opens(), 1);

    assert!(
        h.transport
            .emit("conn1", SessionEvent::Pairing { qr: "2@pairing-ref".into() })
            .await
    );
    let pairing = recv_event(&mut ws, "pairing:conn1").await;
    assert_eq!(pairing["connectionId"], "conn1");
    assert!(
        pairing["qr"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,")
    );
}

#[tokio::test]
async fn commands_cannot_reach_another_tenant() {
    let h = harness().await;
    let addr = h.spawn().await;
    let mut ws = h.client(addr, "co1").await;

    for event in ["session:connect", "session:status", "session:disconnect"] {
        let result = command(&mut ws, event, json!({ "connectionId": "conn2" })).await;
        assert_eq!(result["success"], false, "{event}");
        assert_eq!(result["error"], "connection not found");
    }
    assert_eq!(h.transport.opens(), 0);
    assert!(h.state.store.get_connection("conn2").await.unwrap().is_some());
}

#[tokio::test]
async fn official_api_connection_has_no_direct_session() {
    let h = harness().await;
    let addr = h.spawn().await;
    let mut ws = h.client(addr, "co1").await;

    let result = command(&mut ws, "session:connect", json!({ "connectionId": "api1" })).await;
    assert_eq!(result["success"], false);
    assert_eq!(result["error"], "connection does not use a direct session");
    assert_eq!(h.transport.opens(), 0);
}

#[tokio::test]
async fn official_api_connection_cannot_be_disconnected() {
    let h = harness().await;
    let addr = h.spawn().await;
    let mut ws = h.client(addr, "co1").await;

    let result = command(&mut ws, "session:disconnect", json!({ "connectionId": "api1" })).await;
    assert_eq!(result["success"], false);
    assert_eq!(result["error"], "connection does not use a direct session");

    let connection = h.state.store.get_connection("api1").await.unwrap().unwrap();
    assert!(connection.is_active);
    assert!(recv(&mut ws).await.is_none());
}

#[tokio::test]
async fn status_and_send_without_live_session() {
    let h = harness().await;
    let addr = h.spawn().await;
    let mut ws = h.client(addr, "co1").await;

    let status = command(&mut ws, "session:status", json!({ "connectionId": "conn1" })).await;
    assert_eq!(status["success"], true);
    assert_eq!(status["isConnected"], false);

    let sent = command(
        &mut ws,
        "session:send",
        json!({ "connectionId": "conn1", "to": "5511999990000", "text": "hi" }),
    )
    .await;
    assert_eq!(sent["success"], false);
    assert!(sent["error"].as_str().unwrap().contains("conn1"));
}

#[tokio::test]
async fn unknown_frames_get_an_error_reply() {
    let h = harness().await;
    let addr = h.spawn().await;
    let mut ws = h.client(addr, "co1").await;

    ws.send(Message::text(r#"{"event":"session:explode"}"#)).await.unwrap();
    let reply = recv_event(&mut ws, "error").await;
    assert_eq!(reply["success"], false);
    assert_eq!(reply["error"], "unrecognized command");
}

#[tokio::test]
async fn closed_socket_leaves_its_room() {
    let h = harness().await;
    let addr = h.spawn().await;
    let mut ws = h.client(addr, "co1").await;
    assert_eq!(h.state.hub.member_count("company:co1"), 1);

    ws.close(None).await.unwrap();
    for _ in 0..200 {
        if h.state.hub.member_count("company:co1") == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("socket still in room after close");
}
