// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port traits implemented by adapters and consumed by the services.
//!
//! All ports use `#[async_trait]` so they can be held as `Arc<dyn Trait>`.

pub mod agent;
pub mod gateway;
pub mod realtime;
pub mod store;
pub mod transport;

pub use agent::{AgentChatContext, AgentChatRequest, AiAgent};
pub use gateway::{MessageGateway, ProviderResponse, TemplateMessageRequest, TextMessageRequest};
pub use realtime::{RealtimePublisher, company_room};
pub use store::CrmStore;
pub use transport::{
    AuthState, DirectSocket, DirectTransport, DisconnectReason, InboundProtocolMessage,
    OpenRequest, OpenedSocket, ProtocolLogLevel, ProtocolVersion, SessionEvent, StatusUpdate,
};
