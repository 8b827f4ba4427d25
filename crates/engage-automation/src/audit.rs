// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort, PII-redacted audit trail for automation runs.

use std::sync::Arc;

use engage_core::CrmStore;
use engage_core::types::{LogLevel, NewAutomationLog};
use engage_security::{redact_details, redact_pii};
use serde_json::Value;
use tracing::error;

/// Where an audit entry belongs.
#[derive(Debug, Clone, Copy)]
pub struct AuditScope<'a> {
    pub company_id: &'a str,
    pub conversation_id: Option<&'a str>,
    pub rule_id: Option<&'a str>,
}

impl<'a> AuditScope<'a> {
    pub fn conversation(company_id: &'a str, conversation_id: &'a str) -> Self {
        Self {
            company_id,
            conversation_id: Some(conversation_id),
            rule_id: None,
        }
    }

    pub fn with_rule(self, rule_id: &'a str) -> Self {
        Self {
            rule_id: Some(rule_id),
            ..self
        }
    }
}

/// Writes redacted entries to the automation log.
///
/// A failed write is reported through `tracing` and swallowed.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn CrmStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn log(
        &self,
        scope: AuditScope<'_>,
        level: LogLevel,
        message: &str,
        details: Option<Value>,
    ) {
        let entry = NewAutomationLog {
            company_id: scope.company_id.to_string(),
            conversation_id: scope.conversation_id.map(str::to_string),
            rule_id: scope.rule_id.map(str::to_string),
            level,
            message: redact_pii(message),
            details: details.as_ref().map(redact_details),
        };

        if let Err(e) = self.store.insert_automation_log(&entry).await {
            error!(
                company_id = %entry.company_id,
                level = %entry.level,
                error = %redact_pii(&e.to_string()),
                "failed to write automation log entry"
            );
        }
    }

    pub async fn info(&self, scope: AuditScope<'_>, message: &str, details: Option<Value>) {
        self.log(scope, LogLevel::Info, message, details).await;
    }

    pub async fn warn(&self, scope: AuditScope<'_>, message: &str, details: Option<Value>) {
        self.log(scope, LogLevel::Warn, message, details).await;
    }

    pub async fn error(&self, scope: AuditScope<'_>, message: &str, details: Option<Value>) {
        self.log(scope, LogLevel::Error, message, details).await;
    }
}
