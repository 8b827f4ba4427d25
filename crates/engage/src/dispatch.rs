// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget trigger dispatch.

use engage_automation::TriggerEngine;
use engage_core::types::TriggerRequest;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Runs every received request on its own task. Ends when all senders drop.
pub fn spawn_trigger_dispatcher(
    engine: TriggerEngine,
    mut requests: mpsc::Receiver<TriggerRequest>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .process_incoming_message_trigger(&request.conversation_id, &request.message_id)
                    .await;
            });
        }
        debug!("trigger channel closed, dispatcher stopped");
    })
}
