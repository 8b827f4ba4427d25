// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`CrmStore`] with call counters and failure injection.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use engage_core::types::{
    ActiveDirectSession, AssociationOutcome, AutomationLog, AutomationRule, Company, Connection,
    Contact, Conversation, ConversationStatus, DirectSession, Message, MessageStatus,
    NewAutomationLog, NewMessage, TriggerEvent, timestamp_now,
};
use engage_core::{CrmStore, EngageError};

#[derive(Default)]
struct Tables {
    companies: Vec<Company>,
    connections: Vec<Connection>,
    direct_sessions: Vec<DirectSession>,
    contacts: Vec<Contact>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    rules: Vec<AutomationRule>,
    tags: BTreeSet<(String, String)>,
    lists: BTreeSet<(String, String)>,
    logs: Vec<AutomationLog>,
}

/// Store double that keeps every table in a `Vec`, preserving insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    rule_lookups: AtomicUsize,
    calls: Mutex<HashMap<&'static str, usize>>,
    fail_audit_logs: AtomicBool,
    fail_message_inserts: Mutex<BTreeSet<String>>,
}

fn id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn count(&self, op: &'static str) {
        *self.calls.lock().await.entry(op).or_default() += 1;
    }

    /// Number of `list_active_rules` calls so far.
    pub fn rule_lookups(&self) -> usize {
        self.rule_lookups.load(Ordering::SeqCst)
    }

    /// Number of calls to the named store operation.
    pub async fn calls(&self, op: &str) -> usize {
        self.calls.lock().await.get(op).copied().unwrap_or(0)
    }

    /// Make every `insert_automation_log` fail.
    pub fn fail_audit_logs(&self, fail: bool) {
        self.fail_audit_logs.store(fail, Ordering::SeqCst);
    }

    /// Make `insert_message` fail for messages carrying this content.
    pub async fn fail_message_insert_for(&self, content: &str) {
        self.fail_message_inserts
            .lock()
            .await
            .insert(content.to_string());
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.tables.lock().await.messages.clone()
    }

    pub async fn contacts(&self) -> Vec<Contact> {
        self.tables.lock().await.contacts.clone()
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.tables.lock().await.conversations.clone()
    }

    pub async fn logs(&self) -> Vec<AutomationLog> {
        self.tables.lock().await.logs.clone()
    }

    pub async fn tags_of(&self, contact_id: &str) -> Vec<String> {
        self.tables
            .lock()
            .await
            .tags
            .iter()
            .filter(|(c, _)| c == contact_id)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub async fn lists_of(&self, contact_id: &str) -> Vec<String> {
        self.tables
            .lock()
            .await
            .lists
            .iter()
            .filter(|(c, _)| c == contact_id)
            .map(|(_, l)| l.clone())
            .collect()
    }

    /// Insert a conversation as-is, bypassing find-or-create.
    pub async fn put_conversation(&self, conversation: Conversation) {
        self.tables.lock().await.conversations.push(conversation);
    }

    /// Insert a contact as-is.
    pub async fn put_contact(&self, contact: Contact) {
        self.tables.lock().await.contacts.push(contact);
    }
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn insert_company(&self, company: &Company) -> Result<(), EngageError> {
        self.tables.lock().await.companies.push(company.clone());
        Ok(())
    }

    async fn insert_connection(&self, connection: &Connection) -> Result<(), EngageError> {
        self.tables.lock().await.connections.push(connection.clone());
        Ok(())
    }

    async fn get_connection(&self, id: &str) -> Result<Option<Connection>, EngageError> {
        self.count("get_connection").await;
        Ok(self
            .tables
            .lock()
            .await
            .connections
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn set_connection_active(&self, id: &str, active: bool) -> Result<(), EngageError> {
        self.count("set_connection_active").await;
        if let Some(c) = self
            .tables
            .lock()
            .await
            .connections
            .iter_mut()
            .find(|c| c.id == id)
        {
            c.is_active = active;
        }
        Ok(())
    }

    async fn get_direct_session(
        &self,
        connection_id: &str,
    ) -> Result<Option<DirectSession>, EngageError> {
        Ok(self
            .tables
            .lock()
            .await
            .direct_sessions
            .iter()
            .find(|s| s.connection_id == connection_id)
            .cloned())
    }

    async fn save_direct_session(&self, session: &DirectSession) -> Result<(), EngageError> {
        self.count("save_direct_session").await;
        let mut tables = self.tables.lock().await;
        let position = tables
            .direct_sessions
            .iter()
            .position(|s| s.connection_id == session.connection_id);
        match position {
            Some(i) => tables.direct_sessions[i] = session.clone(),
            None => tables.direct_sessions.push(session.clone()),
        }
        Ok(())
    }

    async fn set_direct_session_active(
        &self,
        connection_id: &str,
        active: bool,
    ) -> Result<(), EngageError> {
        self.count("set_direct_session_active").await;
        if let Some(s) = self
            .tables
            .lock()
            .await
            .direct_sessions
            .iter_mut()
            .find(|s| s.connection_id == connection_id)
        {
            s.is_active = active;
            s.updated_at = timestamp_now();
        }
        Ok(())
    }

    async fn list_active_direct_sessions(&self) -> Result<Vec<ActiveDirectSession>, EngageError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .direct_sessions
            .iter()
            .filter(|s| s.is_active)
            .filter_map(|s| {
                tables
                    .connections
                    .iter()
                    .find(|c| c.id == s.connection_id)
                    .map(|c| ActiveDirectSession {
                        connection_id: s.connection_id.clone(),
                        company_id: c.company_id.clone(),
                    })
            })
            .collect())
    }

    async fn find_or_create_contact(
        &self,
        company_id: &str,
        phone: &str,
        name: Option<&str>,
    ) -> Result<Contact, EngageError> {
        let mut tables = self.tables.lock().await;
        let now = timestamp_now();
        if let Some(existing) = tables
            .contacts
            .iter_mut()
            .find(|c| c.company_id == company_id && c.phone == phone)
        {
            if let Some(name) = name {
                existing.name = Some(name.to_string());
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let contact = Contact {
            id: id(),
            company_id: company_id.to_string(),
            phone: phone.to_string(),
            name: name.map(str::to_string),
            created_at: now.clone(),
            updated_at: now,
        };
        tables.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, EngageError> {
        Ok(self
            .tables
            .lock()
            .await
            .contacts
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_or_create_conversation(
        &self,
        company_id: &str,
        contact_id: &str,
        connection_id: &str,
    ) -> Result<Conversation, EngageError> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.conversations.iter().find(|c| {
            c.contact_id == contact_id && c.connection_id.as_deref() == Some(connection_id)
        }) {
            return Ok(existing.clone());
        }

        let conversation = Conversation {
            id: id(),
            company_id: company_id.to_string(),
            contact_id: contact_id.to_string(),
            connection_id: Some(connection_id.to_string()),
            status: ConversationStatus::New,
            last_message_at: None,
            ai_active: false,
            assigned_to: None,
            created_at: timestamp_now(),
        };
        tables.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, EngageError> {
        Ok(self
            .tables
            .lock()
            .await
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn touch_conversation(
        &self,
        conversation_id: &str,
        last_message_at: &str,
    ) -> Result<(), EngageError> {
        if let Some(c) = self
            .tables
            .lock()
            .await
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            c.last_message_at = Some(last_message_at.to_string());
        }
        Ok(())
    }

    async fn assign_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<(), EngageError> {
        self.count("assign_conversation").await;
        if let Some(c) = self
            .tables
            .lock()
            .await
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            c.assigned_to = Some(user_id.to_string());
        }
        Ok(())
    }

    async fn set_conversation_ai_active(
        &self,
        conversation_id: &str,
        active: bool,
    ) -> Result<(), EngageError> {
        if let Some(c) = self
            .tables
            .lock()
            .await
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            c.ai_active = active;
        }
        Ok(())
    }

    async fn insert_message(&self, message: &NewMessage) -> Result<Message, EngageError> {
        self.count("insert_message").await;
        if self
            .fail_message_inserts
            .lock()
            .await
            .contains(&message.content)
        {
            return Err(EngageError::storage("injected insert failure"));
        }

        let mut tables = self.tables.lock().await;
        if let Some(pid) = &message.provider_message_id
            && tables
                .messages
                .iter()
                .any(|m| m.provider_message_id.as_ref() == Some(pid))
        {
            return Err(EngageError::storage("duplicate provider_message_id"));
        }

        let row = Message {
            id: id(),
            conversation_id: message.conversation_id.clone(),
            sender_type: message.sender_type,
            content: message.content.clone(),
            status: message.status,
            provider_message_id: message.provider_message_id.clone(),
            created_at: timestamp_now(),
        };
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn get_message(&self, id: &str) -> Result<Option<Message>, EngageError> {
        self.count("get_message").await;
        Ok(self
            .tables
            .lock()
            .await
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn update_message_status(
        &self,
        provider_message_id: &str,
        status: MessageStatus,
    ) -> Result<bool, EngageError> {
        self.count("update_message_status").await;
        let mut tables = self.tables.lock().await;
        match tables
            .messages
            .iter_mut()
            .find(|m| m.provider_message_id.as_deref() == Some(provider_message_id))
        {
            Some(m) if m.status.can_advance_to(status) => {
                m.status = status;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_rule(&self, rule: &AutomationRule) -> Result<(), EngageError> {
        self.tables.lock().await.rules.push(rule.clone());
        Ok(())
    }

    async fn list_active_rules(
        &self,
        company_id: &str,
        trigger: TriggerEvent,
        connection_id: &str,
    ) -> Result<Vec<AutomationRule>, EngageError> {
        self.rule_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tables
            .lock()
            .await
            .rules
            .iter()
            .filter(|r| {
                r.company_id == company_id
                    && r.trigger_event == trigger
                    && r.is_active
                    && r.applies_to_connection(connection_id)
            })
            .cloned()
            .collect())
    }

    async fn add_contact_tag(
        &self,
        contact_id: &str,
        tag_id: &str,
    ) -> Result<AssociationOutcome, EngageError> {
        self.count("add_contact_tag").await;
        let inserted = self
            .tables
            .lock()
            .await
            .tags
            .insert((contact_id.to_string(), tag_id.to_string()));
        Ok(outcome(inserted))
    }

    async fn add_contact_to_list(
        &self,
        contact_id: &str,
        list_id: &str,
    ) -> Result<AssociationOutcome, EngageError> {
        self.count("add_contact_to_list").await;
        let inserted = self
            .tables
            .lock()
            .await
            .lists
            .insert((contact_id.to_string(), list_id.to_string()));
        Ok(outcome(inserted))
    }

    async fn insert_automation_log(&self, entry: &NewAutomationLog) -> Result<(), EngageError> {
        if self.fail_audit_logs.load(Ordering::SeqCst) {
            return Err(EngageError::storage("audit log table unavailable"));
        }
        self.tables.lock().await.logs.push(AutomationLog {
            id: id(),
            company_id: entry.company_id.clone(),
            conversation_id: entry.conversation_id.clone(),
            rule_id: entry.rule_id.clone(),
            level: entry.level,
            message: entry.message.clone(),
            details: entry.details.clone(),
            created_at: timestamp_now(),
        });
        Ok(())
    }

    async fn list_automation_logs(
        &self,
        company_id: &str,
    ) -> Result<Vec<AutomationLog>, EngageError> {
        Ok(self
            .tables
            .lock()
            .await
            .logs
            .iter()
            .filter(|l| l.company_id == company_id)
            .cloned()
            .collect())
    }
}

fn outcome(inserted: bool) -> AssociationOutcome {
    if inserted {
        AssociationOutcome::Inserted
    } else {
        AssociationOutcome::AlreadyPresent
    }
}
