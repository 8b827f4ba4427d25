// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversations.

use engage_core::EngageError;
use engage_core::types::{Conversation, timestamp_now};
use rusqlite::params;

use super::{enum_column, optional};
use crate::database::{Database, map_tr_err};

const SELECT_CONVERSATION: &str = "SELECT id, company_id, contact_id, connection_id, status,
        last_message_at, ai_active, assigned_to, created_at
     FROM conversations";

fn conversation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        company_id: row.get(1)?,
        contact_id: row.get(2)?,
        connection_id: row.get(3)?,
        status: enum_column(row, 4)?,
        last_message_at: row.get(5)?,
        ai_active: row.get(6)?,
        assigned_to: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Insert-if-absent on `(contact_id, connection_id)`, then read back.
pub async fn find_or_create_conversation(
    db: &Database,
    company_id: &str,
    contact_id: &str,
    connection_id: &str,
) -> Result<Conversation, EngageError> {
    let id = uuid::Uuid::new_v4().to_string();
    let company_id = company_id.to_string();
    let contact_id = contact_id.to_string();
    let connection_id = connection_id.to_string();
    let now = timestamp_now();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, company_id, contact_id, connection_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'new', ?5)
                 ON CONFLICT(contact_id, connection_id) DO NOTHING",
                params![id, company_id, contact_id, connection_id, now],
            )?;
            conn.query_row(
                &format!("{SELECT_CONVERSATION} WHERE contact_id = ?1 AND connection_id = ?2"),
                params![contact_id, connection_id],
                conversation_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_conversation(
    db: &Database,
    id: &str,
) -> Result<Option<Conversation>, EngageError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                &format!("{SELECT_CONVERSATION} WHERE id = ?1"),
                params![id],
                conversation_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn touch_conversation(
    db: &Database,
    id: &str,
    last_message_at: &str,
) -> Result<(), EngageError> {
    update(
        db,
        "UPDATE conversations SET last_message_at = ?2 WHERE id = ?1",
        id,
        last_message_at.to_string(),
    )
    .await
}

pub async fn assign_conversation(
    db: &Database,
    id: &str,
    user_id: &str,
) -> Result<(), EngageError> {
    update(
        db,
        "UPDATE conversations SET assigned_to = ?2 WHERE id = ?1",
        id,
        user_id.to_string(),
    )
    .await
}

pub async fn set_conversation_ai_active(
    db: &Database,
    id: &str,
    active: bool,
) -> Result<(), EngageError> {
    update(
        db,
        "UPDATE conversations SET ai_active = ?2 WHERE id = ?1",
        id,
        active,
    )
    .await
}

async fn update<V>(db: &Database, sql: &'static str, id: &str, value: V) -> Result<(), EngageError>
where
    V: rusqlite::ToSql + Send + 'static,
{
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(sql, params![id, value])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
