// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle with PRAGMA setup and migrations.
//!
//! All statements run on tokio-rusqlite's single background thread, so
//! writes are serialized without extra locking.

use std::path::Path;

use engage_core::EngageError;
use tracing::{debug, info};

use crate::migrations::run_migrations;

/// Shared handle to the SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` and migrate it.
    pub async fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, EngageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(EngageError::storage)?;
        }

        // Migrations run on a short-lived synchronous connection before the
        // async handle is opened.
        let migrate_path = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), EngageError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(EngageError::storage)?;
            apply_pragmas(&conn, wal_mode).map_err(EngageError::storage)?;
            run_migrations(&mut conn)
        })
        .await
        .map_err(EngageError::storage)??;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(EngageError::storage)?;
        conn.call(move |conn| apply_pragmas(conn, wal_mode))
            .await
            .map_err(map_tr_err)?;

        info!(path = %path.display(), wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(&self) -> Result<(), EngageError> {
        self.conn
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(map_tr_err)?;
        debug!("database checkpointed");
        Ok(())
    }
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), rusqlite::Error> {
    if wal_mode {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
}

/// Convert a tokio-rusqlite error into the storage error variant.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> EngageError {
    EngageError::Storage {
        source: Box::new(e),
    }
}
