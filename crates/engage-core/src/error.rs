// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Engage CRM core.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The error type shared by every port trait and service in the workspace.
#[derive(Debug, Error)]
pub enum EngageError {
    /// Missing or invalid configuration (encryption key, signing secret, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// An external HTTP collaborator (message gateway, AI agent) failed.
    #[error("external service error: {message}")]
    TransientExternal {
        message: String,
        source: Option<BoxedSource>,
    },

    /// The direct-session protocol layer failed.
    #[error("protocol error: {message}")]
    Protocol {
        message: String,
        source: Option<BoxedSource>,
    },

    /// A row that the operation depends on does not exist.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// The durable store failed.
    #[error("storage error: {source}")]
    Storage { source: BoxedSource },

    /// No live direct session is tracked for the connection.
    #[error("no active session for connection {connection_id}")]
    SessionNotFound { connection_id: String },

    /// Encryption or decryption of a stored secret failed.
    #[error("crypto error: {0}")]
    Crypto(String),
}

/// Fieldless classification of [`EngageError`] for pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    TransientExternal,
    Protocol,
    DataIntegrity,
    Storage,
    SessionNotFound,
    Crypto,
}

impl EngageError {
    /// Returns the error's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngageError::Config(_) => ErrorKind::Config,
            EngageError::TransientExternal { .. } => ErrorKind::TransientExternal,
            EngageError::Protocol { .. } => ErrorKind::Protocol,
            EngageError::DataIntegrity(_) => ErrorKind::DataIntegrity,
            EngageError::Storage { .. } => ErrorKind::Storage,
            EngageError::SessionNotFound { .. } => ErrorKind::SessionNotFound,
            EngageError::Crypto(_) => ErrorKind::Crypto,
        }
    }

    /// Shorthand for a [`EngageError::TransientExternal`] without a source.
    pub fn external(message: impl Into<String>) -> Self {
        EngageError::TransientExternal {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`EngageError::Protocol`] without a source.
    pub fn protocol(message: impl Into<String>) -> Self {
        EngageError::Protocol {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage(source: impl Into<BoxedSource>) -> Self {
        EngageError::Storage {
            source: source.into(),
        }
    }
}
