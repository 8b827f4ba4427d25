// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message gateway for `official_api` connections, backed by the WhatsApp
//! Cloud API.

pub mod client;
pub mod types;

pub use client::CloudApiClient;
