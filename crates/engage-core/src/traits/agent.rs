// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External AI agent port.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::EngageError;

/// Conversation context forwarded to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentChatContext {
    pub conversation_id: String,
}

/// Request body of the agent chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentChatRequest {
    pub message: String,
    pub tenant_id: String,
    pub persona_id: String,
    pub contact_id: String,
    pub context: AgentChatContext,
}

/// Produces replies on behalf of an AI persona.
#[async_trait]
pub trait AiAgent: Send + Sync + 'static {
    /// Returns the agent's reply, or `None` when it produced nothing.
    async fn chat(&self, request: &AgentChatRequest) -> Result<Option<String>, EngageError>;
}
