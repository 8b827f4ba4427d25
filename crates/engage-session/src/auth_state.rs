// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed protocol credentials, one directory per connection.

use std::path::{Path, PathBuf};

use engage_core::EngageError;
use engage_core::traits::transport::AuthState;
use tracing::debug;

const CREDS_FILE: &str = "creds.json";

/// Stores each connection's credential bundle at
/// `{root}/{connection_id}/creds.json`.
#[derive(Debug, Clone)]
pub struct FileAuthStore {
    root: PathBuf,
}

impl FileAuthStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, connection_id: &str) -> PathBuf {
        self.root.join(connection_id)
    }

    fn creds_path(&self, connection_id: &str) -> PathBuf {
        self.dir(connection_id).join(CREDS_FILE)
    }

    /// Creates the connection's directory if needed.
    pub async fn ensure_dir(&self, connection_id: &str) -> Result<PathBuf, EngageError> {
        let dir = self.dir(connection_id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            EngageError::Config(format!(
                "cannot create credential directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(dir)
    }

    /// Loads the stored bundle. A missing file is an empty bundle.
    pub async fn load(&self, connection_id: &str) -> Result<AuthState, EngageError> {
        let path = self.creds_path(connection_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| EngageError::Protocol {
                message: format!("corrupt credential file {}", path.display()),
                source: Some(Box::new(e)),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AuthState::default()),
            Err(e) => Err(EngageError::Protocol {
                message: format!("cannot read credential file {}", path.display()),
                source: Some(Box::new(e)),
            }),
        }
    }

    /// Writes the bundle through a temporary file and a rename.
    pub async fn save(&self, connection_id: &str, state: &AuthState) -> Result<(), EngageError> {
        let dir = self.ensure_dir(connection_id).await?;
        let path = dir.join(CREDS_FILE);
        let tmp = dir.join(format!("{CREDS_FILE}.tmp"));

        let bytes = serde_json::to_vec(state).map_err(|e| EngageError::Protocol {
            message: "cannot serialize credentials".into(),
            source: Some(Box::new(e)),
        })?;
        let io_err = |e: std::io::Error| EngageError::Protocol {
            message: format!("cannot write credential file {}", path.display()),
            source: Some(Box::new(e)),
        };
        tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;
        debug!(connection_id, "credentials flushed");
        Ok(())
    }

    /// Deletes the connection's directory. Missing is fine.
    pub async fn remove(&self, connection_id: &str) -> std::io::Result<()> {
        match tokio::fs::remove_dir_all(self.dir(connection_id)).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
