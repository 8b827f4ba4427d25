// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PII scrubbing for text bound for the audit trail.
//!
//! Three passes run in a fixed order: tax identifiers, phone numbers, then
//! email addresses. Each match becomes [`REDACTED`]. The placeholder has no
//! digits and no `@`, so a second pass finds nothing new.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// The redaction placeholder.
pub const REDACTED: &str = "[REDACTED]";

/// Brazilian CPF (`000.000.000-00`) and CNPJ (`00.000.000/0000-00`), with or
/// without punctuation.
static TAX_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\b\d{2}\.?\d{3}\.?\d{3}/?\d{4}-?\d{2}\b").unwrap(),
        Regex::new(r"\b\d{3}\.?\d{3}\.?\d{3}-?\d{2}\b").unwrap(),
    ]
});

/// Phone-like runs: at least eight digits, optionally with a leading `+` or
/// `(` and spaces, dots, dashes or parentheses in between.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d\s().\-]{6,}\d").unwrap());

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap()
});

/// Redacts tax IDs, phone numbers and email addresses from `input`.
pub fn redact_pii(input: &str) -> String {
    let mut result = input.to_string();

    for pattern in TAX_ID_PATTERNS.iter() {
        result = pattern.replace_all(&result, REDACTED).into_owned();
    }
    result = PHONE_PATTERN.replace_all(&result, REDACTED).into_owned();
    EMAIL_PATTERN.replace_all(&result, REDACTED).into_owned()
}

/// Redacts a structured details object by scrubbing its serialized form.
///
/// If the scrubbed text no longer parses as JSON, the redacted string itself
/// is returned as a JSON string value.
pub fn redact_details(details: &Value) -> Value {
    let serialized = details.to_string();
    let redacted = redact_pii(&serialized);
    serde_json::from_str(&redacted).unwrap_or(Value::String(redacted))
}
