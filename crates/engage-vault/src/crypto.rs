// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM seal/open of stored credentials.
//!
//! Ciphertexts are hex strings laid out as `iv (16) || tag (16) || data`.
//! Every call to [`SecretBox::encrypt`] draws a fresh IV from the system
//! CSPRNG.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use engage_core::EngageError;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::debug;

use crate::kdf::derive_key;

/// AES-256-GCM with a 128-bit IV.
type Cipher = AesGcm<Aes256, U16>;

const IV_LEN: usize = 16;
const TAG_LEN: usize = 16;

/// Symmetric encrypt/decrypt of short secrets such as access tokens.
#[derive(Clone)]
pub struct SecretBox {
    key: [u8; 32],
    rng: SystemRandom,
}

impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBox")
            .field("key", &"[redacted]")
            .finish()
    }
}

impl SecretBox {
    /// Builds a secret box from the configured encryption key.
    pub fn new(configured_key: &str) -> Result<Self, EngageError> {
        Ok(Self {
            key: derive_key(configured_key)?,
            rng: SystemRandom::new(),
        })
    }

    fn cipher(&self) -> Result<Cipher, EngageError> {
        Cipher::new_from_slice(&self.key)
            .map_err(|_| EngageError::Crypto("failed to create AES-256-GCM key".to_string()))
    }

    /// Encrypts `plaintext` into hex `iv || tag || ciphertext`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EngageError> {
        let mut iv = [0u8; IV_LEN];
        self.rng
            .fill(&mut iv)
            .map_err(|_| EngageError::Crypto("failed to generate random IV".to_string()))?;

        // aes-gcm appends the tag to the ciphertext.
        let sealed = self
            .cipher()?
            .encrypt(Nonce::<U16>::from_slice(&iv), plaintext.as_bytes())
            .map_err(|_| EngageError::Crypto("AES-256-GCM encryption failed".to_string()))?;
        let (data, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let mut out = Vec::with_capacity(IV_LEN + TAG_LEN + data.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(tag);
        out.extend_from_slice(data);
        Ok(hex::encode(out))
    }

    /// Decrypts a value produced by [`encrypt`](Self::encrypt).
    pub fn try_decrypt(&self, encoded: &str) -> Result<String, EngageError> {
        let raw = hex::decode(encoded.trim())
            .map_err(|e| EngageError::Crypto(format!("ciphertext is not valid hex: {e}")))?;
        if raw.len() < IV_LEN + TAG_LEN {
            return Err(EngageError::Crypto("ciphertext is too short".to_string()));
        }

        let (iv, rest) = raw.split_at(IV_LEN);
        let (tag, data) = rest.split_at(TAG_LEN);
        let mut sealed = Vec::with_capacity(data.len() + TAG_LEN);
        sealed.extend_from_slice(data);
        sealed.extend_from_slice(tag);

        let plain = self
            .cipher()?
            .decrypt(Nonce::<U16>::from_slice(iv), sealed.as_slice())
            .map_err(|_| {
                EngageError::Crypto(
                    "AES-256-GCM decryption failed -- wrong key or corrupted data".to_string(),
                )
            })?;

        String::from_utf8(plain)
            .map_err(|_| EngageError::Crypto("decrypted secret is not UTF-8".to_string()))
    }

    /// Decrypts a stored secret, returning an empty string on any failure.
    pub fn decrypt(&self, encoded: &str) -> String {
        match self.try_decrypt(encoded) {
            Ok(plain) => plain,
            Err(e) => {
                debug!(error = %e, "secret decryption failed");
                String::new()
            }
        }
    }
}
