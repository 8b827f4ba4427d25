// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Room-scoped fan-out to connected sockets.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use engage_core::RealtimePublisher;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Subscribers grouped by room. A frame pushed to a room reaches only that
/// room's members.
#[derive(Debug, Default)]
pub struct RoomHub {
    rooms: DashMap<String, HashMap<String, mpsc::Sender<String>>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room: &str, subscriber_id: &str, tx: mpsc::Sender<String>) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(subscriber_id.to_string(), tx);
        debug!(room, subscriber_id, "joined room");
    }

    pub fn leave(&self, room: &str, subscriber_id: &str) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(subscriber_id);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());
        debug!(room, subscriber_id, "left room");
    }

    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, |members| members.len())
    }
}

/// Serialized frame sent to subscribers.
pub fn frame(event: &str, data: Value) -> String {
    json!({ "event": event, "data": data }).to_string()
}

#[async_trait]
impl RealtimePublisher for RoomHub {
    async fn emit_to_room(&self, room: &str, event: &str, payload: Value) -> usize {
        let senders: Vec<(String, mpsc::Sender<String>)> = match self.rooms.get(room) {
            Some(members) => members
                .iter()
                .map(|(id, tx)| (id.clone(), tx.clone()))
                .collect(),
            None => return 0,
        };

        let text = frame(event, payload);
        let mut reached = 0;
        for (subscriber_id, tx) in senders {
            match tx.try_send(text.clone()) {
                Ok(()) => reached += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(room, %subscriber_id, event, "subscriber queue full; frame dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.leave(room, &subscriber_id);
                }
            }
        }
        reached
    }
}
