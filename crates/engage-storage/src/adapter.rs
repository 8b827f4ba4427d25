// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`CrmStore`].

use async_trait::async_trait;
use engage_config::model::StorageConfig;
use engage_core::types::{
    ActiveDirectSession, AssociationOutcome, AutomationLog, AutomationRule, Company, Connection,
    Contact, Conversation, DirectSession, Message, MessageStatus, NewAutomationLog, NewMessage,
    TriggerEvent,
};
use engage_core::{CrmStore, EngageError};

use crate::database::Database;
use crate::queries;
use crate::queries::contacts::Membership;

/// SQLite-backed CRM store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database described by `config` and run migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, EngageError> {
        Ok(Self::new(
            Database::open(&config.database_path, config.wal_mode).await?,
        ))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl CrmStore for SqliteStore {
    async fn insert_company(&self, company: &Company) -> Result<(), EngageError> {
        queries::tenants::insert_company(&self.db, company).await
    }

    async fn insert_connection(&self, connection: &Connection) -> Result<(), EngageError> {
        queries::tenants::insert_connection(&self.db, connection).await
    }

    async fn get_connection(&self, id: &str) -> Result<Option<Connection>, EngageError> {
        queries::tenants::get_connection(&self.db, id).await
    }

    async fn set_connection_active(&self, id: &str, active: bool) -> Result<(), EngageError> {
        queries::tenants::set_connection_active(&self.db, id, active).await
    }

    async fn get_direct_session(
        &self,
        connection_id: &str,
    ) -> Result<Option<DirectSession>, EngageError> {
        queries::direct_sessions::get_direct_session(&self.db, connection_id).await
    }

    async fn save_direct_session(&self, session: &DirectSession) -> Result<(), EngageError> {
        queries::direct_sessions::save_direct_session(&self.db, session).await
    }

    async fn set_direct_session_active(
        &self,
        connection_id: &str,
        active: bool,
    ) -> Result<(), EngageError> {
        queries::direct_sessions::set_direct_session_active(&self.db, connection_id, active).await
    }

    async fn list_active_direct_sessions(&self) -> Result<Vec<ActiveDirectSession>, EngageError> {
        queries::direct_sessions::list_active_direct_sessions(&self.db).await
    }

    async fn find_or_create_contact(
        &self,
        company_id: &str,
        phone: &str,
        name: Option<&str>,
    ) -> Result<Contact, EngageError> {
        queries::contacts::find_or_create_contact(&self.db, company_id, phone, name).await
    }

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, EngageError> {
        queries::contacts::get_contact(&self.db, id).await
    }

    async fn find_or_create_conversation(
        &self,
        company_id: &str,
        contact_id: &str,
        connection_id: &str,
    ) -> Result<Conversation, EngageError> {
        queries::conversations::find_or_create_conversation(
            &self.db,
            company_id,
            contact_id,
            connection_id,
        )
        .await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, EngageError> {
        queries::conversations::get_conversation(&self.db, id).await
    }

    async fn touch_conversation(
        &self,
        conversation_id: &str,
        last_message_at: &str,
    ) -> Result<(), EngageError> {
        queries::conversations::touch_conversation(&self.db, conversation_id, last_message_at)
            .await
    }

    async fn assign_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<(), EngageError> {
        queries::conversations::assign_conversation(&self.db, conversation_id, user_id).await
    }

    async fn set_conversation_ai_active(
        &self,
        conversation_id: &str,
        active: bool,
    ) -> Result<(), EngageError> {
        queries::conversations::set_conversation_ai_active(&self.db, conversation_id, active)
            .await
    }

    async fn insert_message(&self, message: &NewMessage) -> Result<Message, EngageError> {
        queries::messages::insert_message(&self.db, message).await
    }

    async fn get_message(&self, id: &str) -> Result<Option<Message>, EngageError> {
        queries::messages::get_message(&self.db, id).await
    }

    async fn update_message_status(
        &self,
        provider_message_id: &str,
        status: MessageStatus,
    ) -> Result<bool, EngageError> {
        queries::messages::update_message_status(&self.db, provider_message_id, status).await
    }

    async fn insert_rule(&self, rule: &AutomationRule) -> Result<(), EngageError> {
        queries::automation::insert_rule(&self.db, rule).await
    }

    async fn list_active_rules(
        &self,
        company_id: &str,
        trigger: TriggerEvent,
        connection_id: &str,
    ) -> Result<Vec<AutomationRule>, EngageError> {
        queries::automation::list_active_rules(&self.db, company_id, trigger, connection_id).await
    }

    async fn add_contact_tag(
        &self,
        contact_id: &str,
        tag_id: &str,
    ) -> Result<AssociationOutcome, EngageError> {
        queries::contacts::add_membership(&self.db, Membership::Tag, contact_id, tag_id).await
    }

    async fn add_contact_to_list(
        &self,
        contact_id: &str,
        list_id: &str,
    ) -> Result<AssociationOutcome, EngageError> {
        queries::contacts::add_membership(&self.db, Membership::List, contact_id, list_id).await
    }

    async fn insert_automation_log(&self, entry: &NewAutomationLog) -> Result<(), EngageError> {
        queries::automation::insert_automation_log(&self.db, entry).await
    }

    async fn list_automation_logs(
        &self,
        company_id: &str,
    ) -> Result<Vec<AutomationLog>, EngageError> {
        queries::automation::list_automation_logs(&self.db, company_id).await
    }
}
