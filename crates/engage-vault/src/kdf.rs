// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Derivation of the 32-byte cipher key from the configured secret.

use engage_core::EngageError;
use sha2::{Digest, Sha256};

/// Turns the configured secret into an AES-256 key.
///
/// A secret of exactly 32 bytes is used verbatim; any other length is hashed
/// with SHA-256.
pub fn derive_key(configured: &str) -> Result<[u8; 32], EngageError> {
    if configured.is_empty() {
        return Err(EngageError::Config(
            "security.encryption_key must not be empty".to_string(),
        ));
    }

    let bytes = configured.as_bytes();
    if let Ok(exact) = <[u8; 32]>::try_from(bytes) {
        return Ok(exact);
    }

    Ok(Sha256::digest(bytes).into())
}
