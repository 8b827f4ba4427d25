// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Cloud API.
//!
//! [`CloudApiClient`] resolves the connection's encrypted access token,
//! decrypts it, and posts the message to
//! `{api_base_url}/{api_version}/{phone_number_id}/messages`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use engage_config::model::WhatsAppConfig;
use engage_core::traits::gateway::{
    ProviderResponse, TemplateMessageRequest, TextMessageRequest,
};
use engage_core::{CrmStore, EngageError, MessageGateway};
use engage_vault::SecretBox;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, SendResponse, TemplatePayload, TextPayload};

/// Cloud API sender for `official_api` connections.
#[derive(Clone)]
pub struct CloudApiClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    store: Arc<dyn CrmStore>,
    vault: SecretBox,
}

impl std::fmt::Debug for CloudApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudApiClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

/// Resolved sender identity for one request.
struct Credentials {
    phone_number_id: String,
    access_token: String,
}

impl CloudApiClient {
    pub fn new(
        config: &WhatsAppConfig,
        store: Arc<dyn CrmStore>,
        vault: SecretBox,
    ) -> Result<Self, EngageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EngageError::TransientExternal {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            store,
            vault,
        })
    }

    fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url, self.api_version, phone_number_id
        )
    }

    async fn credentials(&self, connection_id: &str) -> Result<Credentials, EngageError> {
        let connection = self
            .store
            .get_connection(connection_id)
            .await?
            .ok_or_else(|| {
                EngageError::DataIntegrity(format!("connection {connection_id} not found"))
            })?;

        let phone_number_id = connection.phone_number_id.ok_or_else(|| {
            EngageError::DataIntegrity(format!(
                "connection {connection_id} has no phone number id"
            ))
        })?;

        let access_token = connection
            .access_token
            .as_deref()
            .map(|sealed| self.vault.decrypt(sealed))
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                EngageError::DataIntegrity(format!(
                    "connection {connection_id} has no usable access token"
                ))
            })?;

        Ok(Credentials {
            phone_number_id,
            access_token,
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        credentials: &Credentials,
        payload: &T,
    ) -> Result<ProviderResponse, EngageError> {
        let url = self.messages_url(&credentials.phone_number_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| EngageError::TransientExternal {
                message: format!("Cloud API request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, "Cloud API response received");

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => api_err.error.message,
                Err(_) => format!("Cloud API returned {status}"),
            };
            warn!(status = %status, "Cloud API rejected message");
            return Err(EngageError::external(message));
        }

        let body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
        let message_id = serde_json::from_value::<SendResponse>(body.clone())
            .ok()
            .and_then(|r| r.messages.into_iter().next())
            .map(|m| m.id);

        Ok(ProviderResponse { message_id, body })
    }
}

#[async_trait]
impl MessageGateway for CloudApiClient {
    async fn send_template_message(
        &self,
        request: &TemplateMessageRequest,
    ) -> Result<ProviderResponse, EngageError> {
        let credentials = self.credentials(&request.connection_id).await?;
        let payload = TemplatePayload::new(
            &request.to,
            &request.template_name,
            &request.language_code,
            &request.components,
        );
        self.post(&credentials, &payload).await
    }

    async fn send_text_message(
        &self,
        request: &TextMessageRequest,
    ) -> Result<ProviderResponse, EngageError> {
        let credentials = self.credentials(&request.connection_id).await?;
        self.post(&credentials, &TextPayload::new(&request.to, &request.text))
            .await
    }
}
