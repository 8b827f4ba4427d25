// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message gateway port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngageError;

/// A free-text message to send through a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageRequest {
    pub connection_id: String,
    pub to: String,
    pub text: String,
}

/// A pre-approved template message to send through a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMessageRequest {
    pub connection_id: String,
    pub to: String,
    pub template_name: String,
    pub language_code: String,
    #[serde(default)]
    pub components: Vec<serde_json::Value>,
}

/// The provider's answer to a send.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProviderResponse {
    /// Provider-assigned message id, used to correlate status updates.
    pub message_id: Option<String>,
    /// Raw response body.
    pub body: serde_json::Value,
}

/// Sends messages to contacts.
#[async_trait]
pub trait MessageGateway: Send + Sync + 'static {
    async fn send_template_message(
        &self,
        request: &TemplateMessageRequest,
    ) -> Result<ProviderResponse, EngageError>;

    async fn send_text_message(
        &self,
        request: &TextMessageRequest,
    ) -> Result<ProviderResponse, EngageError>;
}
