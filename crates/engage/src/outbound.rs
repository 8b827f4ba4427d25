// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound sends routed by the connection's protocol mode.

use std::sync::Arc;

use async_trait::async_trait;
use engage_core::traits::gateway::{ProviderResponse, TemplateMessageRequest, TextMessageRequest};
use engage_core::types::{Connection, ProtocolMode};
use engage_core::{CrmStore, EngageError, MessageGateway};
use engage_session::SessionManager;
use serde_json::json;
use tracing::debug;

/// `official_api` connections go to the Cloud API client, `direct_session`
/// connections to the live session of the session manager.
pub struct ChannelRouter {
    store: Arc<dyn CrmStore>,
    cloud: Arc<dyn MessageGateway>,
    sessions: SessionManager,
}

impl ChannelRouter {
    pub fn new(
        store: Arc<dyn CrmStore>,
        cloud: Arc<dyn MessageGateway>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            store,
            cloud,
            sessions,
        }
    }

    async fn connection(&self, connection_id: &str) -> Result<Connection, EngageError> {
        self.store
            .get_connection(connection_id)
            .await?
            .ok_or_else(|| EngageError::DataIntegrity(format!("connection {connection_id} not found")))
    }
}

#[async_trait]
impl MessageGateway for ChannelRouter {
    async fn send_template_message(
        &self,
        request: &TemplateMessageRequest,
    ) -> Result<ProviderResponse, EngageError> {
        match self.connection(&request.connection_id).await?.protocol_mode {
            ProtocolMode::OfficialApi => self.cloud.send_template_message(request).await,
            ProtocolMode::DirectSession => Err(EngageError::protocol(
                "template messages need an official_api connection",
            )),
        }
    }

    async fn send_text_message(
        &self,
        request: &TextMessageRequest,
    ) -> Result<ProviderResponse, EngageError> {
        match self.connection(&request.connection_id).await?.protocol_mode {
            ProtocolMode::OfficialApi => self.cloud.send_text_message(request).await,
            ProtocolMode::DirectSession => {
                let message_id = self
                    .sessions
                    .try_send_message(&request.connection_id, &request.to, &request.text)
                    .await?;
                debug!(connection_id = %request.connection_id, %message_id, "sent over direct session");
                Ok(ProviderResponse {
                    message_id: Some(message_id.clone()),
                    body: json!({ "messageId": message_id }),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engage_core::ErrorKind;
    use engage_session::{FileAuthStore, SessionSettings};
    use engage_test_utils::{FakeTransport, MemoryStore, MockGateway, RecordingPublisher, fixtures};
    use engage_vault::SecretBox;
    use tokio::sync::mpsc;

    struct Harness {
        router: ChannelRouter,
        cloud: Arc<MockGateway>,
        transport: Arc<FakeTransport>,
        sessions: SessionManager,
        _auth_dir: tempfile::TempDir,
    }

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        store.insert_company(&fixtures::company("co1")).await.unwrap();
        for (id, mode) in [
            ("api1", ProtocolMode::OfficialApi),
            ("direct1", ProtocolMode::DirectSession),
        ] {
            store
                .insert_connection(&fixtures::connection(id, "co1", mode))
                .await
                .unwrap();
        }
        let auth_dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::new());
        let (tx, _rx) = mpsc::channel(4);
        let sessions = SessionManager::new(
            store.clone(),
            transport.clone(),
            Arc::new(RecordingPublisher::new()),
            SecretBox::new("router-test-key").unwrap(),
            FileAuthStore::new(auth_dir.path()),
            SessionSettings::default(),
            tx,
        );
        let cloud = Arc::new(MockGateway::new());
        Harness {
            router: ChannelRouter::new(store, cloud.clone(), sessions.clone()),
            cloud,
            transport,
            sessions,
            _auth_dir: auth_dir,
        }
    }

    fn text(connection_id: &str) -> TextMessageRequest {
        TextMessageRequest {
            connection_id: connection_id.into(),
            to: "5511999990000".into(),
            text: "Olá".into(),
        }
    }

    #[tokio::test]
    async fn official_connections_use_the_cloud_client() {
        let h = harness().await;
        let response = h.router.send_text_message(&text("api1")).await.unwrap();
        assert_eq!(response.message_id.as_deref(), Some("wamid.mock-1"));
        assert_eq!(h.cloud.sent_texts().await, vec![text("api1")]);
    }

    #[tokio::test]
    async fn direct_connections_use_the_live_session() {
        let h = harness().await;
        h.sessions.connect_session("direct1", "co1").await.unwrap();

        let response = h.router.send_text_message(&text("direct1")).await.unwrap();

        assert_eq!(response.message_id.as_deref(), Some("direct1-out-1"));
        assert_eq!(h.cloud.attempts(), 0);
        let socket = h.transport.socket("direct1").await.unwrap();
        assert_eq!(
            socket.sent().await,
            vec![("5511999990000@s.whatsapp.net".to_string(), "Olá".to_string())]
        );
    }

    #[tokio::test]
    async fn direct_connection_without_session_fails() {
        let h = harness().await;
        let err = h.router.send_text_message(&text("direct1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
    }

    #[tokio::test]
    async fn templates_are_official_only() {
        let h = harness().await;
        let request = TemplateMessageRequest {
            connection_id: "direct1".into(),
            to: "5511999990000".into(),
            template_name: "welcome".into(),
            language_code: "pt_BR".into(),
            components: vec![],
        };
        let err = h.router.send_template_message(&request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);

        let official = TemplateMessageRequest {
            connection_id: "api1".into(),
            ..request
        };
        h.router.send_template_message(&official).await.unwrap();
        assert_eq!(h.cloud.sent_templates().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_connection_is_a_data_error() {
        let h = harness().await;
        let err = h.router.send_text_message(&text("ghost")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    }
}
