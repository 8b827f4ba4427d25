// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capturing [`MessageGateway`] double.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use engage_core::traits::gateway::{
    ProviderResponse, TemplateMessageRequest, TextMessageRequest,
};
use engage_core::{EngageError, MessageGateway};

/// Records every send. Optionally fails every send with a provider error.
#[derive(Default)]
pub struct MockGateway {
    texts: Mutex<Vec<TextMessageRequest>>,
    templates: Mutex<Vec<TemplateMessageRequest>>,
    failure: Mutex<Option<String>>,
    counter: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent send fails with `message`.
    pub async fn fail_with(&self, message: &str) {
        *self.failure.lock().await = Some(message.to_string());
    }

    pub async fn sent_texts(&self) -> Vec<TextMessageRequest> {
        self.texts.lock().await.clone()
    }

    pub async fn sent_templates(&self) -> Vec<TemplateMessageRequest> {
        self.templates.lock().await.clone()
    }

    /// Number of send attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<ProviderResponse, EngageError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(message) = self.failure.lock().await.clone() {
            return Err(EngageError::external(message));
        }
        let id = format!("wamid.mock-{n}");
        Ok(ProviderResponse {
            message_id: Some(id.clone()),
            body: json!({ "messages": [{ "id": id }] }),
        })
    }
}

#[async_trait]
impl MessageGateway for MockGateway {
    async fn send_template_message(
        &self,
        request: &TemplateMessageRequest,
    ) -> Result<ProviderResponse, EngageError> {
        let response = self.respond().await;
        if response.is_ok() {
            self.templates.lock().await.push(request.clone());
        }
        response
    }

    async fn send_text_message(
        &self,
        request: &TextMessageRequest,
    ) -> Result<ProviderResponse, EngageError> {
        let response = self.respond().await;
        if response.is_ok() {
            self.texts.lock().await.push(request.clone());
        }
        response
    }
}
