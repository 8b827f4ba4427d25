// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time notification port.

use async_trait::async_trait;

/// Name of the subscription room of a tenant.
///
/// All pushes about a tenant go to this room and nowhere else.
pub fn company_room(company_id: &str) -> String {
    format!("company:{company_id}")
}

/// Room-scoped publish primitive.
#[async_trait]
pub trait RealtimePublisher: Send + Sync + 'static {
    /// Pushes `event` with `payload` to every subscriber of `room`.
    ///
    /// Delivery is best effort; returns the number of subscribers reached.
    async fn emit_to_room(&self, room: &str, event: &str, payload: serde_json::Value) -> usize;
}
