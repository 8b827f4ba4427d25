// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity builders with sensible defaults.

use engage_core::types::{
    Action, ActionType, AutomationRule, Company, Condition, ConditionOperator, ConditionType,
    Connection, ProtocolMode, TriggerEvent, timestamp_now,
};

pub fn company(id: &str) -> Company {
    Company {
        id: id.to_string(),
        name: format!("Company {id}"),
        created_at: timestamp_now(),
    }
}

/// An active connection. Official API connections get phone number id
/// `PHONE_ID` and no token.
pub fn connection(id: &str, company_id: &str, mode: ProtocolMode) -> Connection {
    Connection {
        id: id.to_string(),
        company_id: company_id.to_string(),
        name: format!("Connection {id}"),
        protocol_mode: mode,
        phone_number_id: (mode == ProtocolMode::OfficialApi).then(|| "PHONE_ID".to_string()),
        access_token: None,
        app_secret: None,
        is_active: true,
        ai_persona_id: None,
        created_at: timestamp_now(),
    }
}

pub fn condition(kind: ConditionType, operator: ConditionOperator, value: &str) -> Condition {
    Condition {
        kind,
        operator,
        value: value.to_string(),
    }
}

pub fn action(kind: ActionType, value: &str) -> Action {
    Action {
        kind,
        value: value.to_string(),
    }
}

/// An active, unscoped rule on `new_message_received`.
pub fn rule(
    id: &str,
    company_id: &str,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
) -> AutomationRule {
    AutomationRule {
        id: id.to_string(),
        company_id: company_id.to_string(),
        name: format!("Rule {id}"),
        trigger_event: TriggerEvent::NewMessageReceived,
        conditions,
        actions,
        connection_ids: None,
        is_active: true,
        created_at: timestamp_now(),
    }
}
