// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Companies and connections.

use engage_core::EngageError;
use engage_core::types::{Company, Connection};
use rusqlite::params;

use super::{enum_column, optional};
use crate::database::{Database, map_tr_err};

pub async fn insert_company(db: &Database, company: &Company) -> Result<(), EngageError> {
    let company = company.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO companies (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![company.id, company.name, company.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_connection(db: &Database, connection: &Connection) -> Result<(), EngageError> {
    let c = connection.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO connections (id, company_id, name, protocol_mode, phone_number_id,
                     access_token, app_secret, is_active, ai_persona_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    c.id,
                    c.company_id,
                    c.name,
                    c.protocol_mode.to_string(),
                    c.phone_number_id,
                    c.access_token,
                    c.app_secret,
                    c.is_active,
                    c.ai_persona_id,
                    c.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_connection(db: &Database, id: &str) -> Result<Option<Connection>, EngageError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, company_id, name, protocol_mode, phone_number_id, access_token,
                        app_secret, is_active, ai_persona_id, created_at
                 FROM connections WHERE id = ?1",
            )?;
            optional(stmt.query_row(params![id], |row| {
                Ok(Connection {
                    id: row.get(0)?,
                    company_id: row.get(1)?,
                    name: row.get(2)?,
                    protocol_mode: enum_column(row, 3)?,
                    phone_number_id: row.get(4)?,
                    access_token: row.get(5)?,
                    app_secret: row.get(6)?,
                    is_active: row.get(7)?,
                    ai_persona_id: row.get(8)?,
                    created_at: row.get(9)?,
                })
            }))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_connection_active(
    db: &Database,
    id: &str,
    active: bool,
) -> Result<(), EngageError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE connections SET is_active = ?2 WHERE id = ?1",
                params![id, active],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
