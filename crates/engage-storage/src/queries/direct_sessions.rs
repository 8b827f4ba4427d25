// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted state of direct (QR-paired) sessions.

use engage_core::EngageError;
use engage_core::types::{ActiveDirectSession, DirectSession, timestamp_now};
use rusqlite::params;

use super::optional;
use crate::database::{Database, map_tr_err};

pub async fn get_direct_session(
    db: &Database,
    connection_id: &str,
) -> Result<Option<DirectSession>, EngageError> {
    let connection_id = connection_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT connection_id, session_data, phone_number, is_active,
                        last_connected_at, updated_at
                 FROM direct_sessions WHERE connection_id = ?1",
            )?;
            optional(stmt.query_row(params![connection_id], |row| {
                Ok(DirectSession {
                    connection_id: row.get(0)?,
                    session_data: row.get(1)?,
                    phone_number: row.get(2)?,
                    is_active: row.get(3)?,
                    last_connected_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Upsert keyed by `connection_id`.
pub async fn save_direct_session(db: &Database, session: &DirectSession) -> Result<(), EngageError> {
    let s = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO direct_sessions
                     (connection_id, session_data, phone_number, is_active, last_connected_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(connection_id) DO UPDATE SET
                     session_data = excluded.session_data,
                     phone_number = excluded.phone_number,
                     is_active = excluded.is_active,
                     last_connected_at = excluded.last_connected_at,
                     updated_at = excluded.updated_at",
                params![
                    s.connection_id,
                    s.session_data,
                    s.phone_number,
                    s.is_active,
                    s.last_connected_at,
                    s.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_direct_session_active(
    db: &Database,
    connection_id: &str,
    active: bool,
) -> Result<(), EngageError> {
    let connection_id = connection_id.to_string();
    let now = timestamp_now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE direct_sessions SET is_active = ?2, updated_at = ?3
                 WHERE connection_id = ?1",
                params![connection_id, active, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Active sessions joined with the owning tenant.
pub async fn list_active_direct_sessions(
    db: &Database,
) -> Result<Vec<ActiveDirectSession>, EngageError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT ds.connection_id, c.company_id
                 FROM direct_sessions ds
                 JOIN connections c ON c.id = ds.connection_id
                 WHERE ds.is_active = 1
                 ORDER BY ds.rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ActiveDirectSession {
                    connection_id: row.get(0)?,
                    company_id: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
