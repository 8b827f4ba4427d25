// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hands inbound messages to the external AI agent and relays its reply.
//!
//! The reply is split into paragraphs that are sent one by one with a fixed
//! pause between them, and each sent paragraph is stored as an `ai` message.

use std::sync::Arc;
use std::time::Duration;

use engage_core::traits::agent::{AgentChatContext, AgentChatRequest};
use engage_core::traits::gateway::TextMessageRequest;
use engage_core::types::{MessageStatus, NewMessage, SenderType, timestamp_now};
use engage_core::{AiAgent, CrmStore, MessageGateway};
use engage_security::redact_pii;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::audit::AuditLogger;
use crate::context::TriggerContext;

/// Routes conversations with an active AI persona to the agent.
#[derive(Clone)]
pub struct AiRouter {
    agent: Option<Arc<dyn AiAgent>>,
    gateway: Arc<dyn MessageGateway>,
    store: Arc<dyn CrmStore>,
    audit: AuditLogger,
    pacing: Duration,
}

impl AiRouter {
    pub fn new(
        agent: Option<Arc<dyn AiAgent>>,
        gateway: Arc<dyn MessageGateway>,
        store: Arc<dyn CrmStore>,
        audit: AuditLogger,
        pacing: Duration,
    ) -> Self {
        Self {
            agent,
            gateway,
            store,
            audit,
            pacing,
        }
    }

    /// Asks the agent for a reply and sends it.
    ///
    /// Returns `true` when at least one paragraph reached the contact.
    pub async fn route(&self, ctx: &TriggerContext, persona_id: &str) -> bool {
        let Some(agent) = &self.agent else {
            debug!(conversation_id = %ctx.conversation.id, "no AI agent configured");
            return false;
        };
        let Some(connection_id) = ctx.connection_id() else {
            warn!(conversation_id = %ctx.conversation.id, "conversation has no connection; AI routing skipped");
            return false;
        };

        let request = AgentChatRequest {
            message: ctx.message_text().to_string(),
            tenant_id: ctx.company_id.clone(),
            persona_id: persona_id.to_string(),
            contact_id: ctx.contact.id.clone(),
            context: AgentChatContext {
                conversation_id: ctx.conversation.id.clone(),
            },
        };

        let reply = match agent.chat(&request).await {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                debug!(conversation_id = %ctx.conversation.id, "AI agent produced no reply");
                return false;
            }
            Err(e) => {
                let reason = redact_pii(&e.to_string());
                warn!(conversation_id = %ctx.conversation.id, error = %reason, "AI agent call failed");
                self.audit
                    .error(
                        ctx.audit_scope(),
                        &format!("AI agent call failed: {reason}"),
                        Some(json!({ "persona": persona_id })),
                    )
                    .await;
                return false;
            }
        };

        let paragraphs = split_paragraphs(&reply);
        let mut sent = 0usize;

        for (index, paragraph) in paragraphs.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
            }

            let send = TextMessageRequest {
                connection_id: connection_id.to_string(),
                to: ctx.contact.phone.clone(),
                text: paragraph.clone(),
            };
            let response = match self.gateway.send_text_message(&send).await {
                Ok(response) => response,
                Err(e) => {
                    let reason = redact_pii(&e.to_string());
                    warn!(conversation_id = %ctx.conversation.id, error = %reason, "AI reply send failed");
                    self.audit
                        .error(
                            ctx.audit_scope(),
                            &format!("AI reply send failed: {reason}"),
                            Some(json!({ "paragraph": index + 1, "of": paragraphs.len() })),
                        )
                        .await;
                    break;
                }
            };
            sent += 1;

            let message = NewMessage {
                conversation_id: ctx.conversation.id.clone(),
                sender_type: SenderType::Ai,
                content: paragraph.clone(),
                status: MessageStatus::Sent,
                provider_message_id: response.message_id,
            };
            if let Err(e) = self.store.insert_message(&message).await {
                warn!(conversation_id = %ctx.conversation.id, error = %e, "failed to store AI reply");
                continue;
            }
            if let Err(e) = self
                .store
                .touch_conversation(&ctx.conversation.id, &timestamp_now())
                .await
            {
                warn!(conversation_id = %ctx.conversation.id, error = %e, "failed to touch conversation");
            }
        }

        if sent > 0 {
            info!(conversation_id = %ctx.conversation.id, paragraphs = sent, "AI reply sent");
            self.audit
                .info(
                    ctx.audit_scope(),
                    "AI agent replied",
                    Some(json!({ "persona": persona_id, "paragraphs": sent })),
                )
                .await;
        }
        sent > 0
    }
}

/// Splits text on blank lines into trimmed, non-empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut paragraphs);
    paragraphs
}

fn flush(lines: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let paragraph = lines.join("\n").trim().to_string();
    lines.clear();
    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }
}
