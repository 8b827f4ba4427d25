// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The automation trigger engine.
//!
//! Runs once per persisted inbound message: AI routing first, then the
//! tenant's active rules in store order. Everything runs sequentially and
//! nothing is returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use engage_core::types::TriggerEvent;
use engage_core::{AiAgent, CrmStore, EngageError, MessageGateway};
use serde_json::json;
use tracing::{debug, error, info};

use crate::actions::ActionExecutor;
use crate::ai_routing::AiRouter;
use crate::audit::AuditLogger;
use crate::conditions::all_conditions_hold;
use crate::context::TriggerContext;

/// Reacts to inbound messages with AI replies or rule actions.
#[derive(Clone)]
pub struct TriggerEngine {
    store: Arc<dyn CrmStore>,
    audit: AuditLogger,
    router: AiRouter,
    executor: ActionExecutor,
}

impl TriggerEngine {
    pub fn new(
        store: Arc<dyn CrmStore>,
        gateway: Arc<dyn MessageGateway>,
        agent: Option<Arc<dyn AiAgent>>,
        reply_pacing: Duration,
    ) -> Self {
        let audit = AuditLogger::new(store.clone());
        let router = AiRouter::new(
            agent,
            gateway.clone(),
            store.clone(),
            audit.clone(),
            reply_pacing,
        );
        let executor = ActionExecutor::new(store.clone(), gateway, audit.clone());
        Self {
            store,
            audit,
            router,
            executor,
        }
    }

    /// Processes one inbound message. Failures are logged, never returned.
    pub async fn process_incoming_message_trigger(&self, conversation_id: &str, message_id: &str) {
        if let Err(e) = self.run(conversation_id, message_id).await {
            error!(
                conversation_id,
                message_id,
                error = %engage_security::redact_pii(&e.to_string()),
                "automation trigger aborted"
            );
        }
    }

    async fn run(&self, conversation_id: &str, message_id: &str) -> Result<(), EngageError> {
        let Some(conversation) = self.store.get_conversation(conversation_id).await? else {
            error!(conversation_id, "conversation not found; trigger aborted");
            return Ok(());
        };
        let Some(connection_id) = conversation.connection_id.clone() else {
            error!(conversation_id, "conversation has no connection; trigger aborted");
            return Ok(());
        };
        let Some(connection) = self.store.get_connection(&connection_id).await? else {
            error!(conversation_id, %connection_id, "connection not found; trigger aborted");
            return Ok(());
        };
        let Some(contact) = self.store.get_contact(&conversation.contact_id).await? else {
            error!(conversation_id, "contact not found; trigger aborted");
            return Ok(());
        };
        let company_id = conversation.company_id.clone();

        if conversation.ai_active
            && let Some(persona_id) = connection.ai_persona_id.clone()
        {
            match self.store.get_message(message_id).await? {
                Some(message) => {
                    let ctx = TriggerContext {
                        company_id: company_id.clone(),
                        conversation: conversation.clone(),
                        connection: connection.clone(),
                        contact: contact.clone(),
                        message,
                    };
                    if self.router.route(&ctx, &persona_id).await {
                        debug!(conversation_id, "AI replied; rules skipped");
                        return Ok(());
                    }
                }
                None => {
                    error!(conversation_id, message_id, "message not found; AI routing skipped");
                }
            }
        }

        let rules = self
            .store
            .list_active_rules(&company_id, TriggerEvent::NewMessageReceived, &connection_id)
            .await?;

        let scope = crate::audit::AuditScope::conversation(&company_id, conversation_id);
        if rules.is_empty() {
            debug!(conversation_id, "no active automation rule");
            self.audit
                .info(scope, "No active rule for new_message_received", None)
                .await;
            return Ok(());
        }
        self.audit
            .info(
                scope,
                &format!("Evaluating {} active rule(s)", rules.len()),
                Some(json!({ "trigger": TriggerEvent::NewMessageReceived.to_string() })),
            )
            .await;

        let Some(message) = self.store.get_message(message_id).await? else {
            error!(conversation_id, message_id, "message not found; rules skipped");
            self.audit
                .error(scope, "Triggering message not found", None)
                .await;
            return Ok(());
        };

        let ctx = TriggerContext {
            company_id: company_id.clone(),
            conversation,
            connection,
            contact,
            message,
        };

        for rule in &rules {
            if !all_conditions_hold(&rule.conditions, &ctx) {
                continue;
            }
            info!(conversation_id, rule_id = %rule.id, "automation rule matched");
            self.audit
                .info(
                    scope.with_rule(&rule.id),
                    &format!("Rule '{}' matched", rule.name),
                    Some(json!({ "actions": rule.actions.len() })),
                )
                .await;
            self.executor.execute_rule(rule, &ctx).await;
        }

        Ok(())
    }
}
