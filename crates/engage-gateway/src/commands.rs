// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session commands accepted over an authenticated socket.
//!
//! Client -> Server:
//! ```json
//! {"event": "session:connect", "data": {"connectionId": "conn-1"}}
//! {"event": "session:send", "data": {"connectionId": "conn-1", "to": "5511999990000", "text": "hi"}}
//! ```
//!
//! Server -> Client:
//! ```json
//! {"event": "session:connect:result", "data": {"success": true}}
//! ```

use engage_core::types::{Connection, ProtocolMode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::auth::Principal;
use crate::rooms::frame;
use crate::server::GatewayState;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum Command {
    #[serde(rename = "session:connect", rename_all = "camelCase")]
    Connect { connection_id: String },
    #[serde(rename = "session:disconnect", rename_all = "camelCase")]
    Disconnect { connection_id: String },
    #[serde(rename = "session:status", rename_all = "camelCase")]
    Status { connection_id: String },
    #[serde(rename = "session:send", rename_all = "camelCase")]
    Send {
        connection_id: String,
        to: String,
        text: String,
    },
}

impl Command {
    pub fn result_event(&self) -> &'static str {
        match self {
            Command::Connect { .. } => "session:connect:result",
            Command::Disconnect { .. } => "session:disconnect:result",
            Command::Status { .. } => "session:status:result",
            Command::Send { .. } => "session:send:result",
        }
    }

    fn connection_id(&self) -> &str {
        match self {
            Command::Connect { connection_id }
            | Command::Disconnect { connection_id }
            | Command::Status { connection_id }
            | Command::Send { connection_id, .. } => connection_id,
        }
    }
}

/// Parses one client frame and runs it, returning the reply frame.
pub async fn handle_frame(state: &GatewayState, principal: &Principal, text: &str) -> String {
    match serde_json::from_str::<Command>(text) {
        Ok(command) => {
            let data = run(state, principal, &command).await;
            frame(command.result_event(), data)
        }
        Err(e) => {
            warn!(user_id = %principal.user_id, error = %e, "unrecognized socket frame");
            frame("error", failure("unrecognized command"))
        }
    }
}

async fn run(state: &GatewayState, principal: &Principal, command: &Command) -> Value {
    let connection = match owned_connection(state, principal, command.connection_id()).await {
        Ok(connection) => connection,
        Err(reason) => return failure(&reason),
    };
    let needs_direct = matches!(
        command,
        Command::Connect { .. } | Command::Disconnect { .. } | Command::Send { .. }
    );
    if needs_direct && connection.protocol_mode != ProtocolMode::DirectSession {
        return failure("connection does not use a direct session");
    }

    match command {
        Command::Connect { connection_id } => {
            info!(connection_id, user_id = %principal.user_id, "session connect requested");
            match state
                .sessions
                .connect_session(connection_id, &connection.company_id)
                .await
            {
                Ok(()) => json!({ "success": true }),
                Err(e) => failure(&e.to_string()),
            }
        }
        Command::Disconnect { connection_id } => {
            info!(connection_id, user_id = %principal.user_id, "session disconnect requested");
            match state.sessions.disconnect_session(connection_id).await {
                Ok(()) => json!({ "success": true }),
                Err(e) => failure(&e.to_string()),
            }
        }
        Command::Status { connection_id } => match state.sessions.get_status(connection_id).await {
            Ok(status) => {
                let mut data = serde_json::to_value(status).unwrap_or_else(|_| json!({}));
                data["success"] = json!(true);
                data
            }
            Err(e) => failure(&e.to_string()),
        },
        Command::Send {
            connection_id,
            to,
            text,
        } => {
            let outcome = state.sessions.send_message(connection_id, to, text).await;
            serde_json::to_value(outcome).unwrap_or_else(|e| failure(&e.to_string()))
        }
    }
}

/// Resolves a connection only when it belongs to the caller's tenant.
async fn owned_connection(
    state: &GatewayState,
    principal: &Principal,
    connection_id: &str,
) -> Result<Connection, String> {
    match state.store.get_connection(connection_id).await {
        Ok(Some(connection)) if connection.company_id == principal.company_id => Ok(connection),
        Ok(_) => Err("connection not found".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn failure(reason: &str) -> Value {
    json!({ "success": false, "error": reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_camel_case_frames() {
        let cmd: Command = serde_json::from_str(
            r#"{"event":"session:send","data":{"connectionId":"c1","to":"5511","text":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Send {
                connection_id: "c1".into(),
                to: "5511".into(),
                text: "hi".into(),
            }
        );
        assert_eq!(cmd.result_event(), "session:send:result");
    }

    #[test]
    fn unknown_events_do_not_parse() {
        assert!(
            serde_json::from_str::<Command>(r#"{"event":"session:explode","data":{}}"#).is_err()
        );
    }
}
