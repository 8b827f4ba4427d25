// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule action execution.
//!
//! Actions run one at a time in declaration order. Every outcome goes to the
//! audit log and a failed action never stops the ones after it.

use std::sync::Arc;

use engage_core::traits::gateway::TextMessageRequest;
use engage_core::types::{Action, ActionType, AssociationOutcome, AutomationRule};
use engage_core::{CrmStore, EngageError, MessageGateway};
use engage_security::redact_pii;
use serde_json::json;
use tracing::{debug, warn};

use crate::audit::AuditLogger;
use crate::context::TriggerContext;

/// What happened to one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    /// The action type is not supported.
    Unsupported,
    Failed(String),
}

/// Runs the actions of matched rules against the store and the gateway.
#[derive(Clone)]
pub struct ActionExecutor {
    store: Arc<dyn CrmStore>,
    gateway: Arc<dyn MessageGateway>,
    audit: AuditLogger,
}

impl ActionExecutor {
    pub fn new(
        store: Arc<dyn CrmStore>,
        gateway: Arc<dyn MessageGateway>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            store,
            gateway,
            audit,
        }
    }

    /// Executes every action of `rule` in order.
    ///
    /// Without a connection on the conversation nothing runs.
    pub async fn execute_rule(&self, rule: &AutomationRule, ctx: &TriggerContext) {
        let scope = ctx.audit_scope().with_rule(&rule.id);

        if ctx.connection_id().is_none() {
            warn!(
                conversation_id = %ctx.conversation.id,
                rule_id = %rule.id,
                "conversation has no connection; skipping rule actions"
            );
            self.audit
                .warn(
                    scope,
                    "Conversation has no connection; actions skipped",
                    Some(json!({ "actions": rule.actions.len() })),
                )
                .await;
            return;
        }

        for action in &rule.actions {
            let outcome = self.execute_action(action, ctx).await;
            let details = Some(json!({
                "action": action_name(action.kind),
                "value": action.value,
            }));
            match outcome {
                ActionOutcome::Done => {
                    self.audit
                        .info(
                            scope,
                            &format!("Action '{}' executed", action_name(action.kind)),
                            details,
                        )
                        .await;
                }
                ActionOutcome::Unsupported => {
                    self.audit
                        .warn(scope, "Unsupported action type skipped", details)
                        .await;
                }
                ActionOutcome::Failed(reason) => {
                    self.audit
                        .error(
                            scope,
                            &format!(
                                "Action '{}' failed: {reason}",
                                action_name(action.kind)
                            ),
                            details,
                        )
                        .await;
                }
            }
        }
    }

    /// Executes one action and reports its outcome. Never returns an error.
    pub async fn execute_action(&self, action: &Action, ctx: &TriggerContext) -> ActionOutcome {
        let result = match action.kind {
            ActionType::SendMessage => self.send_message(action, ctx).await,
            ActionType::AddTag => self
                .store
                .add_contact_tag(&ctx.contact.id, &action.value)
                .await
                .map(|outcome| log_association("tag", outcome)),
            ActionType::AddToList => self
                .store
                .add_contact_to_list(&ctx.contact.id, &action.value)
                .await
                .map(|outcome| log_association("list", outcome)),
            ActionType::AssignUser => {
                self.store
                    .assign_conversation(&ctx.conversation.id, &action.value)
                    .await
            }
            ActionType::Unknown => {
                warn!(conversation_id = %ctx.conversation.id, "unknown action type");
                return ActionOutcome::Unsupported;
            }
        };

        match result {
            Ok(()) => ActionOutcome::Done,
            Err(e) => {
                let reason = redact_pii(&e.to_string());
                warn!(
                    conversation_id = %ctx.conversation.id,
                    action = action_name(action.kind),
                    error = %reason,
                    "automation action failed"
                );
                ActionOutcome::Failed(reason)
            }
        }
    }

    async fn send_message(&self, action: &Action, ctx: &TriggerContext) -> Result<(), EngageError> {
        let connection_id = ctx.connection_id().ok_or_else(|| {
            EngageError::DataIntegrity(format!(
                "conversation {} has no connection",
                ctx.conversation.id
            ))
        })?;

        let request = TextMessageRequest {
            connection_id: connection_id.to_string(),
            to: ctx.contact.phone.clone(),
            text: action.value.clone(),
        };
        let response = self.gateway.send_text_message(&request).await?;
        debug!(
            conversation_id = %ctx.conversation.id,
            provider_message_id = ?response.message_id,
            "automation message sent"
        );
        Ok(())
    }
}

fn log_association(kind: &str, outcome: AssociationOutcome) {
    if outcome == AssociationOutcome::AlreadyPresent {
        debug!(kind, "contact already associated");
    }
}

/// Wire name of an action type, used in audit entries.
pub fn action_name(kind: ActionType) -> &'static str {
    match kind {
        ActionType::SendMessage => "send_message",
        ActionType::AddTag => "add_tag",
        ActionType::AddToList => "add_to_list",
        ActionType::AssignUser => "assign_user",
        ActionType::Unknown => "unknown",
    }
}
