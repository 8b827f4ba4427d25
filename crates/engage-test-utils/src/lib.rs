// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for Engage crates.
//!
//! - [`MemoryStore`]: in-memory store with call counters
//! - [`MockGateway`]: captures outbound sends, can fail on demand
//! - [`MockAgent`]: scripted AI agent replies
//! - [`RecordingPublisher`]: captures real-time room emissions
//! - [`FakeTransport`] / [`FakeSocket`]: scriptable direct-protocol connection

pub mod fake_transport;
pub mod fixtures;
pub mod memory_store;
pub mod mock_agent;
pub mod mock_gateway;
pub mod recording_publisher;

pub use fake_transport::{FakeSocket, FakeTransport};
pub use memory_store::MemoryStore;
pub use mock_agent::{AgentReply, MockAgent};
pub use mock_gateway::MockGateway;
pub use recording_publisher::{Emission, RecordingPublisher};
