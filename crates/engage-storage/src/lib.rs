// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Engage CRM.
//!
//! [`SqliteStore`] implements the [`engage_core::CrmStore`] port on top of a
//! single tokio-rusqlite connection, with the schema managed by refinery.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::{Database, map_tr_err};
