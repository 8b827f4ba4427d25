// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Direct-session manager.
//!
//! [`SessionManager`] keeps one multi-device protocol connection per
//! `direct_session` connection. It pushes pairing codes and connection
//! changes to the tenant's real-time room, stores inbound messages and hands
//! them to the trigger dispatcher, and applies delivery acknowledgements.

pub mod auth_state;
mod events;
pub mod jid;
pub mod manager;
pub mod qr;
pub mod reconnect;
pub mod state;

pub use auth_state::FileAuthStore;
pub use manager::{SendOutcome, SessionManager, SessionSettings, SessionStatus};
pub use reconnect::ReconnectHandle;
pub use state::SessionState;
