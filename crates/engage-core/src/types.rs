// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain entities shared by the store, the automation engine, and the
//! session manager.
//!
//! Every entity belongs to exactly one tenant (`company_id`). Identifiers are
//! UUID strings and timestamps are RFC 3339 strings with millisecond
//! precision, matching how they are persisted.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Current UTC time in the persisted timestamp format.
pub fn timestamp_now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// How a connection talks to the messaging provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProtocolMode {
    /// Stateless official HTTP Cloud API.
    OfficialApi,
    /// Stateful multi-device session paired by QR code.
    DirectSession,
}

/// Tenant isolation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// A configured messaging channel of a tenant.
///
/// `access_token` and `app_secret` hold hex ciphertext produced by the
/// secret store, never plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub protocol_mode: ProtocolMode,
    pub phone_number_id: Option<String>,
    pub access_token: Option<String>,
    pub app_secret: Option<String>,
    pub is_active: bool,
    pub ai_persona_id: Option<String>,
    pub created_at: String,
}

/// Persisted state of a direct-session connection (one per connection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectSession {
    pub connection_id: String,
    /// Encrypted, serialized protocol credentials.
    pub session_data: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub last_connected_at: Option<String>,
    pub updated_at: String,
}

/// An active direct session joined with its tenant, used for startup reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDirectSession {
    pub connection_id: String,
    pub company_id: String,
}

/// A customer, unique per `(company_id, phone)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub company_id: String,
    pub phone: String,
    pub name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    New,
    InProgress,
    Archived,
}

/// A thread between one contact and one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub company_id: String,
    pub contact_id: String,
    pub connection_id: Option<String>,
    pub status: ConversationStatus,
    pub last_message_at: Option<String>,
    /// Whether AI auto-response is enabled for this conversation.
    pub ai_active: bool,
    pub assigned_to: Option<String>,
    pub created_at: String,
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Contact,
    Agent,
    Ai,
}

/// Delivery status of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Received,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    /// Position in the `sent -> delivered -> read` progression.
    ///
    /// `None` for statuses outside the progression, which are never
    /// overwritten by a progression update.
    pub fn progression_rank(self) -> Option<u8> {
        match self {
            MessageStatus::Sent => Some(1),
            MessageStatus::Delivered => Some(2),
            MessageStatus::Read => Some(3),
            MessageStatus::Received | MessageStatus::Failed => None,
        }
    }

    /// Whether a message currently in `self` may move to `next`.
    pub fn can_advance_to(self, next: MessageStatus) -> bool {
        match (self.progression_rank(), next.progression_rank()) {
            (Some(current), Some(candidate)) => candidate > current,
            _ => false,
        }
    }

    /// Maps the direct protocol's numeric acknowledgement code.
    pub fn from_protocol_code(code: u8) -> Option<MessageStatus> {
        match code {
            1 => Some(MessageStatus::Sent),
            2 => Some(MessageStatus::Delivered),
            3 => Some(MessageStatus::Read),
            _ => None,
        }
    }
}

/// Immutable message record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_type: SenderType,
    pub content: String,
    pub status: MessageStatus,
    pub provider_message_id: Option<String>,
    pub created_at: String,
}

/// Fields needed to append a message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender_type: SenderType,
    pub content: String,
    pub status: MessageStatus,
    pub provider_message_id: Option<String>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    NewMessageReceived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    MessageContent,
    /// Recognized but not evaluated yet; always false.
    ContactTag,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Contains,
    NotContains,
    Equals,
    NotEquals,
    #[serde(other)]
    Unknown,
}

/// One predicate of a rule; all of a rule's conditions must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendMessage,
    AddTag,
    AddToList,
    AssignUser,
    #[serde(other)]
    Unknown,
}

/// A side effect executed when a rule matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(default)]
    pub value: String,
}

/// A tenant's automation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub trigger_event: TriggerEvent,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    /// `None` applies the rule to every connection of the tenant.
    pub connection_ids: Option<Vec<String>>,
    pub is_active: bool,
    pub created_at: String,
}

impl AutomationRule {
    /// Whether the rule's connection scope includes `connection_id`.
    pub fn applies_to_connection(&self, connection_id: &str) -> bool {
        match &self.connection_ids {
            None => true,
            Some(ids) => ids.iter().any(|id| id == connection_id),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Audit entry to persist. Text fields are expected to be redacted already.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAutomationLog {
    pub company_id: String,
    pub conversation_id: Option<String>,
    pub rule_id: Option<String>,
    pub level: LogLevel,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Persisted audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationLog {
    pub id: String,
    pub company_id: String,
    pub conversation_id: Option<String>,
    pub rule_id: Option<String>,
    pub level: LogLevel,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub created_at: String,
}

/// Result of an idempotent association insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationOutcome {
    Inserted,
    AlreadyPresent,
}

/// Request to run the trigger engine for a persisted inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    pub conversation_id: String,
    pub message_id: String,
}
