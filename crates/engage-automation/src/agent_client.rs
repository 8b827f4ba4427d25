// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external AI agent chat endpoint.

use std::time::Duration;

use async_trait::async_trait;
use engage_config::model::AiAgentConfig;
use engage_core::traits::agent::AgentChatRequest;
use engage_core::{AiAgent, EngageError};
use serde::Deserialize;
use tracing::{debug, warn};

/// Response envelope of the agent endpoint: a reply or an error.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// [`AiAgent`] backed by `POST {endpoint}`.
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAgentClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, EngageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngageError::TransientExternal {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Builds a client when an endpoint is configured.
    pub fn from_config(config: &AiAgentConfig) -> Result<Option<Self>, EngageError> {
        config
            .endpoint
            .as_deref()
            .map(|endpoint| {
                Self::new(endpoint, Duration::from_secs(config.request_timeout_secs))
            })
            .transpose()
    }
}

#[async_trait]
impl AiAgent for HttpAgentClient {
    async fn chat(&self, request: &AgentChatRequest) -> Result<Option<String>, EngageError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| EngageError::TransientExternal {
                message: format!("AI agent request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, "AI agent response received");

        if !status.is_success() {
            warn!(status = %status, "AI agent returned an error status");
            return Err(EngageError::external(format!("AI agent returned {status}")));
        }

        let parsed = serde_json::from_str::<ChatResponse>(&body).map_err(|e| {
            EngageError::TransientExternal {
                message: "AI agent returned an unreadable response".into(),
                source: Some(Box::new(e)),
            }
        })?;

        if let Some(error) = parsed.error {
            let message = error
                .as_str()
                .map(str::to_string)
                .or_else(|| error.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| error.to_string());
            return Err(EngageError::external(format!("AI agent error: {message}")));
        }

        Ok(parsed.message.filter(|m| !m.trim().is_empty()))
    }
}
