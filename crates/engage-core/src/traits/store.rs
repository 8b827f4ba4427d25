// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store port for the CRM entities.

use async_trait::async_trait;

use crate::error::EngageError;
use crate::types::{
    ActiveDirectSession, AssociationOutcome, AutomationLog, AutomationRule, Company, Connection,
    Contact, Conversation, DirectSession, Message, MessageStatus, NewAutomationLog, NewMessage,
    TriggerEvent,
};

/// Persistence backend for contacts, conversations, messages, rules, and
/// direct-session state.
///
/// Every lookup that spans entities is scoped by tenant; implementations must
/// never return rows of another company.
#[async_trait]
pub trait CrmStore: Send + Sync + 'static {
    // --- Tenants and connections ---

    async fn insert_company(&self, company: &Company) -> Result<(), EngageError>;

    async fn insert_connection(&self, connection: &Connection) -> Result<(), EngageError>;

    async fn get_connection(&self, id: &str) -> Result<Option<Connection>, EngageError>;

    async fn set_connection_active(&self, id: &str, active: bool) -> Result<(), EngageError>;

    // --- Direct sessions ---

    async fn get_direct_session(
        &self,
        connection_id: &str,
    ) -> Result<Option<DirectSession>, EngageError>;

    /// Inserts or replaces the row keyed by `connection_id`.
    async fn save_direct_session(&self, session: &DirectSession) -> Result<(), EngageError>;

    /// Sets `is_active`. A missing row is a no-op.
    async fn set_direct_session_active(
        &self,
        connection_id: &str,
        active: bool,
    ) -> Result<(), EngageError>;

    /// All direct sessions flagged active, joined with their tenant id.
    async fn list_active_direct_sessions(&self) -> Result<Vec<ActiveDirectSession>, EngageError>;

    // --- Contacts and conversations ---

    /// Finds the contact by `(company_id, phone)` or creates it. A provided
    /// `name` replaces the stored display name.
    async fn find_or_create_contact(
        &self,
        company_id: &str,
        phone: &str,
        name: Option<&str>,
    ) -> Result<Contact, EngageError>;

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, EngageError>;

    /// Finds the conversation by `(contact_id, connection_id)` or creates it.
    async fn find_or_create_conversation(
        &self,
        company_id: &str,
        contact_id: &str,
        connection_id: &str,
    ) -> Result<Conversation, EngageError>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, EngageError>;

    async fn touch_conversation(
        &self,
        conversation_id: &str,
        last_message_at: &str,
    ) -> Result<(), EngageError>;

    async fn assign_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<(), EngageError>;

    async fn set_conversation_ai_active(
        &self,
        conversation_id: &str,
        active: bool,
    ) -> Result<(), EngageError>;

    // --- Messages ---

    async fn insert_message(&self, message: &NewMessage) -> Result<Message, EngageError>;

    async fn get_message(&self, id: &str) -> Result<Option<Message>, EngageError>;

    /// Moves the message matched by `provider_message_id` forward to `status`.
    ///
    /// Returns `false` when no message matches or the status would regress.
    async fn update_message_status(
        &self,
        provider_message_id: &str,
        status: MessageStatus,
    ) -> Result<bool, EngageError>;

    // --- Automation ---

    async fn insert_rule(&self, rule: &AutomationRule) -> Result<(), EngageError>;

    /// Active rules of the tenant for `trigger` whose scope is null or
    /// contains `connection_id`, in store order.
    async fn list_active_rules(
        &self,
        company_id: &str,
        trigger: TriggerEvent,
        connection_id: &str,
    ) -> Result<Vec<AutomationRule>, EngageError>;

    async fn add_contact_tag(
        &self,
        contact_id: &str,
        tag_id: &str,
    ) -> Result<AssociationOutcome, EngageError>;

    async fn add_contact_to_list(
        &self,
        contact_id: &str,
        list_id: &str,
    ) -> Result<AssociationOutcome, EngageError>;

    async fn insert_automation_log(&self, entry: &NewAutomationLog) -> Result<(), EngageError>;

    /// Audit entries of a tenant, oldest first.
    async fn list_automation_logs(
        &self,
        company_id: &str,
    ) -> Result<Vec<AutomationLog>, EngageError>;
}
