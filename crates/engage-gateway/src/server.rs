// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;

use axum::{Json, Router, extract::State, middleware as axum_middleware, routing::get};
use engage_config::model::ServerConfig;
use engage_core::{CrmStore, EngageError};
use engage_session::SessionManager;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::TokenAuthority;
use crate::rooms::RoomHub;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub hub: Arc<RoomHub>,
    pub sessions: SessionManager,
    pub store: Arc<dyn CrmStore>,
    pub tokens: Arc<TokenAuthority>,
}

/// Routes:
/// - GET /health (public)
/// - GET /ws?token=... (token checked before the upgrade)
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .with_state(state.clone());

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            ws::require_token,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "live_sessions": state.sessions.live_session_count(),
    }))
}

/// Binds `host:port` and serves until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), EngageError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| EngageError::Config(format!("failed to bind gateway to {addr}: {e}")))?;
    serve(listener, state, shutdown).await
}

/// Serves on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), EngageError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Gateway server listening on {addr}");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| EngageError::TransientExternal {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}
