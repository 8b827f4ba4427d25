// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The in-memory bundle passed through condition and action evaluation.

use engage_core::types::{Connection, Contact, Conversation, Message};

use crate::audit::AuditScope;

/// Tenant, conversation, connection, contact and triggering message of one
/// inbound event. Never persisted.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub company_id: String,
    pub conversation: Conversation,
    pub connection: Connection,
    pub contact: Contact,
    pub message: Message,
}

impl TriggerContext {
    pub fn message_text(&self) -> &str {
        &self.message.content
    }

    /// Channel of the conversation, if it has one.
    pub fn connection_id(&self) -> Option<&str> {
        self.conversation.connection_id.as_deref()
    }

    pub fn audit_scope(&self) -> AuditScope<'_> {
        AuditScope::conversation(&self.company_id, &self.conversation.id)
    }
}
