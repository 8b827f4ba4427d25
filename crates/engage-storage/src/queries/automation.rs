// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation rules and the audit log.

use engage_core::EngageError;
use engage_core::types::{
    AutomationLog, AutomationRule, NewAutomationLog, TriggerEvent, timestamp_now,
};
use rusqlite::params;

use super::{enum_column, json_column, optional_json_column, to_json_text};
use crate::database::{Database, map_tr_err};

pub async fn insert_rule(db: &Database, rule: &AutomationRule) -> Result<(), EngageError> {
    let rule = rule.clone();
    db.connection()
        .call(move |conn| {
            let connection_ids = rule.connection_ids.as_ref().map(to_json_text).transpose()?;
            conn.execute(
                "INSERT INTO automation_rules (id, company_id, name, trigger_event, conditions,
                     actions, connection_ids, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    rule.id,
                    rule.company_id,
                    rule.name,
                    rule.trigger_event.to_string(),
                    to_json_text(&rule.conditions)?,
                    to_json_text(&rule.actions)?,
                    connection_ids,
                    rule.is_active,
                    rule.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Active rules for a tenant and trigger, scoped to `connection_id`, in
/// insertion order.
pub async fn list_active_rules(
    db: &Database,
    company_id: &str,
    trigger: TriggerEvent,
    connection_id: &str,
) -> Result<Vec<AutomationRule>, EngageError> {
    let company_id = company_id.to_string();
    let connection_id = connection_id.to_string();
    let rules = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, company_id, name, trigger_event, conditions, actions,
                        connection_ids, is_active, created_at
                 FROM automation_rules
                 WHERE company_id = ?1 AND trigger_event = ?2 AND is_active = 1
                 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![company_id, trigger.to_string()], |row| {
                Ok(AutomationRule {
                    id: row.get(0)?,
                    company_id: row.get(1)?,
                    name: row.get(2)?,
                    trigger_event: enum_column(row, 3)?,
                    conditions: json_column(row, 4)?,
                    actions: json_column(row, 5)?,
                    connection_ids: optional_json_column(row, 6)?,
                    is_active: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(rules
        .into_iter()
        .filter(|rule| rule.applies_to_connection(&connection_id))
        .collect())
}

pub async fn insert_automation_log(
    db: &Database,
    entry: &NewAutomationLog,
) -> Result<(), EngageError> {
    let entry = entry.clone();
    let id = uuid::Uuid::new_v4().to_string();
    let now = timestamp_now();
    db.connection()
        .call(move |conn| {
            let details = entry.details.as_ref().map(to_json_text).transpose()?;
            conn.execute(
                "INSERT INTO automation_logs (id, company_id, conversation_id, rule_id, level,
                     message, details, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    entry.company_id,
                    entry.conversation_id,
                    entry.rule_id,
                    entry.level.to_string(),
                    entry.message,
                    details,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_automation_logs(
    db: &Database,
    company_id: &str,
) -> Result<Vec<AutomationLog>, EngageError> {
    let company_id = company_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, company_id, conversation_id, rule_id, level, message, details, created_at
                 FROM automation_logs WHERE company_id = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![company_id], |row| {
                Ok(AutomationLog {
                    id: row.get(0)?,
                    company_id: row.get(1)?,
                    conversation_id: row.get(2)?,
                    rule_id: row.get(3)?,
                    level: enum_column(row, 4)?,
                    message: row.get(5)?,
                    details: optional_json_column(row, 6)?,
                    created_at: row.get(7)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
