// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message log.

use engage_core::EngageError;
use engage_core::types::{Message, MessageStatus, NewMessage, timestamp_now};
use rusqlite::params;
use tracing::debug;

use super::{enum_column, optional};
use crate::database::{Database, map_tr_err};

pub async fn insert_message(db: &Database, message: &NewMessage) -> Result<Message, EngageError> {
    let row = Message {
        id: uuid::Uuid::new_v4().to_string(),
        conversation_id: message.conversation_id.clone(),
        sender_type: message.sender_type,
        content: message.content.clone(),
        status: message.status,
        provider_message_id: message.provider_message_id.clone(),
        created_at: timestamp_now(),
    };
    let m = row.clone();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender_type, content, status,
                     provider_message_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    m.id,
                    m.conversation_id,
                    m.sender_type.to_string(),
                    m.content,
                    m.status.to_string(),
                    m.provider_message_id,
                    m.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

    Ok(row)
}

pub async fn get_message(db: &Database, id: &str) -> Result<Option<Message>, EngageError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                "SELECT id, conversation_id, sender_type, content, status,
                        provider_message_id, created_at
                 FROM messages WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Message {
                        id: row.get(0)?,
                        conversation_id: row.get(1)?,
                        sender_type: enum_column(row, 2)?,
                        content: row.get(3)?,
                        status: enum_column(row, 4)?,
                        provider_message_id: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// Forward-only status update keyed by the provider's message id.
///
/// The read-check-write runs inside one closure on the database thread.
pub async fn update_message_status(
    db: &Database,
    provider_message_id: &str,
    status: MessageStatus,
) -> Result<bool, EngageError> {
    let provider_message_id = provider_message_id.to_string();
    db.connection()
        .call(move |conn| {
            let current: Option<MessageStatus> = optional(conn.query_row(
                "SELECT status FROM messages WHERE provider_message_id = ?1",
                params![provider_message_id],
                |row| enum_column(row, 0),
            ))?;

            let Some(current) = current else {
                debug!(provider_message_id = %provider_message_id, "status update for unknown message");
                return Ok(false);
            };
            if !current.can_advance_to(status) {
                return Ok(false);
            }

            let changed = conn.execute(
                "UPDATE messages SET status = ?2 WHERE provider_message_id = ?1",
                params![provider_message_id, status.to_string()],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
