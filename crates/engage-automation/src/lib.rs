// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation for the Engage CRM.
//!
//! [`TriggerEngine`] decides how the system reacts to an inbound message:
//! an AI persona reply through [`AiRouter`], or the tenant's automation
//! rules evaluated by the condition checker and run by [`ActionExecutor`].
//! Every step leaves a PII-redacted entry in the automation log.

pub mod actions;
pub mod agent_client;
pub mod ai_routing;
pub mod audit;
pub mod conditions;
pub mod context;
pub mod engine;

pub use actions::{ActionExecutor, ActionOutcome};
pub use agent_client::HttpAgentClient;
pub use ai_routing::{AiRouter, split_paragraphs};
pub use audit::{AuditLogger, AuditScope};
pub use conditions::check_condition;
pub use context::TriggerContext;
pub use engine::TriggerEngine;
