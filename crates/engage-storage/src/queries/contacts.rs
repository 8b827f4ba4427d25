// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contacts and their tag/list memberships.

use engage_core::EngageError;
use engage_core::types::{AssociationOutcome, Contact, timestamp_now};
use rusqlite::params;

use super::optional;
use crate::database::{Database, map_tr_err};

fn contact_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        company_id: row.get(1)?,
        phone: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Upsert on `(company_id, phone)`. A provided name replaces the stored one.
pub async fn find_or_create_contact(
    db: &Database,
    company_id: &str,
    phone: &str,
    name: Option<&str>,
) -> Result<Contact, EngageError> {
    let id = uuid::Uuid::new_v4().to_string();
    let company_id = company_id.to_string();
    let phone = phone.to_string();
    let name = name.map(str::to_string);
    let now = timestamp_now();

    db.connection()
        .call(move |conn| {
            conn.query_row(
                "INSERT INTO contacts (id, company_id, phone, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(company_id, phone) DO UPDATE SET
                     name = COALESCE(excluded.name, contacts.name),
                     updated_at = excluded.updated_at
                 RETURNING id, company_id, phone, name, created_at, updated_at",
                params![id, company_id, phone, name, now],
                contact_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_contact(db: &Database, id: &str) -> Result<Option<Contact>, EngageError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                "SELECT id, company_id, phone, name, created_at, updated_at
                 FROM contacts WHERE id = ?1",
                params![id],
                contact_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// Association tables whose rows are `(contact_id, <other>_id, created_at)`.
#[derive(Debug, Clone, Copy)]
pub enum Membership {
    Tag,
    List,
}

impl Membership {
    fn insert_sql(self) -> &'static str {
        match self {
            Membership::Tag => {
                "INSERT INTO contact_tags (contact_id, tag_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(contact_id, tag_id) DO NOTHING"
            }
            Membership::List => {
                "INSERT INTO contact_list_members (contact_id, list_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(contact_id, list_id) DO NOTHING"
            }
        }
    }
}

/// Idempotent membership insert.
pub async fn add_membership(
    db: &Database,
    kind: Membership,
    contact_id: &str,
    target_id: &str,
) -> Result<AssociationOutcome, EngageError> {
    let contact_id = contact_id.to_string();
    let target_id = target_id.to_string();
    let now = timestamp_now();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(kind.insert_sql(), params![contact_id, target_id, now])?;
            Ok(if inserted == 0 {
                AssociationOutcome::AlreadyPresent
            } else {
                AssociationOutcome::Inserted
            })
        })
        .await
        .map_err(map_tr_err)
}
