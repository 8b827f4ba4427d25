// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time gateway for the Engage CRM.
//!
//! Authenticated sockets join the room of their tenant, receive session
//! notifications pushed through [`RoomHub`], and drive direct sessions with
//! `session:*` commands.

pub mod auth;
pub mod commands;
pub mod rooms;
pub mod server;
pub mod ws;

pub use auth::{AuthError, Principal, TokenAuthority, TokenClaims};
pub use rooms::RoomHub;
pub use server::{GatewayState, router, serve, start_server};
