// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signed real-time tokens.
//!
//! Tokens are HS256 JWTs carrying the user id (`sub`) and the tenant
//! (`company_id`). A verified token becomes a [`Principal`] bound to the
//! socket before it joins any room.

use std::time::Duration;

use engage_core::EngageError;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub company_id: String,
    pub exp: usize,
}

/// Identity bound to an authenticated socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub company_id: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
}

/// Issues and verifies real-time tokens with one shared secret.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("secret", &"[redacted]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenAuthority {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, EngageError> {
        if secret.trim().is_empty() {
            return Err(EngageError::Config("jwt_secret must not be empty".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        })
    }

    /// Mints a token for `user_id` in `company_id`, valid for the configured TTL.
    pub fn issue(&self, user_id: &str, company_id: &str) -> Result<String, EngageError> {
        let exp = chrono::Utc::now().timestamp().max(0) as usize + self.ttl.as_secs() as usize;
        self.sign(&TokenClaims {
            sub: user_id.to_string(),
            company_id: company_id.to_string(),
            exp,
        })
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, EngageError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| EngageError::Crypto(format!("cannot sign token: {e}")))
    }

    pub fn verify(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?
            .claims;

        if claims.sub.is_empty() || claims.company_id.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(Principal {
            user_id: claims.sub,
            company_id: claims.company_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority(secret: &str) -> TokenAuthority {
        TokenAuthority::new(secret, Duration::from_secs(3600)).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_principal() {
        let auth = authority("realtime-secret");
        let token = auth.issue("user-1", "co1").unwrap();
        assert_eq!(
            auth.verify(Some(&token)).unwrap(),
            Principal {
                user_id: "user-1".into(),
                company_id: "co1".into(),
            }
        );
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = authority("secret-a").issue("user-1", "co1").unwrap();
        assert_eq!(
            authority("secret-b").verify(Some(&token)),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = authority("realtime-secret");
        let token = auth
            .sign(&TokenClaims {
                sub: "user-1".into(),
                company_id: "co1".into(),
                exp: (chrono::Utc::now().timestamp() - 3600) as usize,
            })
            .unwrap();
        assert_eq!(auth.verify(Some(&token)), Err(AuthError::TokenExpired));
    }

    #[test]
    fn missing_and_garbage_tokens_are_rejected() {
        let auth = authority("realtime-secret");
        assert_eq!(auth.verify(None), Err(AuthError::MissingToken));
        assert_eq!(auth.verify(Some("  ")), Err(AuthError::MissingToken));
        assert_eq!(auth.verify(Some("not.a.jwt")), Err(AuthError::InvalidToken));
    }

    #[test]
    fn tenantless_token_is_rejected() {
        let auth = authority("realtime-secret");
        let token = auth.issue("user-1", "").unwrap();
        assert_eq!(auth.verify(Some(&token)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        let err = TokenAuthority::new(" ", Duration::from_secs(60)).unwrap_err();
        assert_eq!(err.kind(), engage_core::ErrorKind::Config);
    }

    #[test]
    fn debug_redacts_secret() {
        let debug = format!("{:?}", authority("realtime-secret"));
        assert!(!debug.contains("realtime-secret"));
    }
}
