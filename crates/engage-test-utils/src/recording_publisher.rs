// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`RealtimePublisher`] that records emissions.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use engage_core::RealtimePublisher;

/// One captured `emit_to_room` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub room: String,
    pub event: String,
    pub payload: Value,
}

#[derive(Default)]
pub struct RecordingPublisher {
    emissions: Mutex<Vec<Emission>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn emissions(&self) -> Vec<Emission> {
        self.emissions.lock().await.clone()
    }

    /// Emissions whose event name equals `event`.
    pub async fn events_named(&self, event: &str) -> Vec<Emission> {
        self.emissions
            .lock()
            .await
            .iter()
            .filter(|e| e.event == event)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RealtimePublisher for RecordingPublisher {
    async fn emit_to_room(&self, room: &str, event: &str, payload: Value) -> usize {
        self.emissions.lock().await.push(Emission {
            room: room.to_string(),
            event: event.to_string(),
            payload,
        });
        1
    }
}
