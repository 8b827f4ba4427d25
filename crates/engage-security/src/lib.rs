// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redaction of personal data before it reaches the automation audit trail.

pub mod redact;

pub use redact::{REDACTED, redact_details, redact_pii};
