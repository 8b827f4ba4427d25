// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret store adapter for the Engage CRM.
//!
//! Encrypts connection credentials (access tokens, app secrets, direct-session
//! credential bundles) with AES-256-GCM under a key derived from the
//! configured `security.encryption_key`.

pub mod crypto;
pub mod kdf;

pub use crypto::SecretBox;
pub use kdf::derive_key;
