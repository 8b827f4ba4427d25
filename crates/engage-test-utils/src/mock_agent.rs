// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted [`AiAgent`] double.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use engage_core::traits::agent::AgentChatRequest;
use engage_core::{AiAgent, EngageError};

/// Scripted outcome of one chat call.
#[derive(Debug, Clone)]
pub enum AgentReply {
    Text(String),
    Nothing,
    Unreachable(String),
}

/// Pops one scripted reply per call; answers `Nothing` once the script runs out.
#[derive(Default)]
pub struct MockAgent {
    replies: Mutex<VecDeque<AgentReply>>,
    requests: Mutex<Vec<AgentChatRequest>>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = AgentReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn requests(&self) -> Vec<AgentChatRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl AiAgent for MockAgent {
    async fn chat(&self, request: &AgentChatRequest) -> Result<Option<String>, EngageError> {
        self.requests.lock().await.push(request.clone());
        match self.replies.lock().await.pop_front() {
            Some(AgentReply::Text(text)) => Ok(Some(text)),
            Some(AgentReply::Nothing) | None => Ok(None),
            Some(AgentReply::Unreachable(message)) => Err(EngageError::external(message)),
        }
    }
}
