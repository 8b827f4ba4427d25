// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated WebSocket endpoint.
//!
//! The token is checked before the upgrade; a socket only ever joins the
//! room of the tenant named in its token.

use axum::{
    Extension,
    extract::{
        Query, Request, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use engage_core::company_room;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::Principal;
use crate::commands::handle_frame;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// Rejects the request with 401 unless `?token=` verifies.
pub async fn require_token(
    State(state): State<GatewayState>,
    Query(params): Query<WsParams>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match state.tokens.verify(params.token.as_deref()) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!(reason = %e, "socket handshake rejected");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    Extension(principal): Extension<Principal>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, principal))
}

async fn handle_socket(socket: WebSocket, state: GatewayState, principal: Principal) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let subscriber_id = uuid::Uuid::new_v4().to_string();
    let room = company_room(&principal.company_id);

    let (tx, mut rx) = mpsc::channel::<String>(64);
    state.hub.join(&room, &subscriber_id, tx.clone());
    info!(%subscriber_id, user_id = %principal.user_id, %room, "socket joined");

    let send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let reply = handle_frame(&state, &principal, text.as_str()).await;
                if tx.send(reply).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.hub.leave(&room, &subscriber_id);
    send_task.abort();
    debug!(%subscriber_id, "socket closed");
}
