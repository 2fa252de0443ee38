// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use corvo_core::CorvoError;
use tracing::debug;

use crate::migrations;

/// Handle to the single SQLite connection shared by the whole process.
///
/// Cloning is cheap (the underlying handle is a channel sender); all clones
/// funnel into the same background writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode enabled,
    /// apply PRAGMAs, and run pending migrations.
    pub async fn open(path: &str) -> Result<Self, CorvoError> {
        Self::open_with_options(path, true).await
    }

    /// Open with explicit control over WAL mode.
    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, CorvoError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CorvoError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        let db = Self { conn };
        db.setup(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open an in-memory database (tests and ephemeral tooling).
    pub async fn open_in_memory() -> Result<Self, CorvoError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        let db = Self { conn };
        db.setup(false).await?;
        Ok(db)
    }

    /// Apply PRAGMAs and run embedded migrations.
    async fn setup(&self, wal_mode: bool) -> Result<(), CorvoError> {
        self.conn
            .call(move |conn| -> Result<(), CorvoError> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")
                        .map_err(map_rq_err)?;
                }
                conn.pragma_update(None, "synchronous", "NORMAL")
                    .map_err(map_rq_err)?;
                conn.pragma_update(None, "foreign_keys", "ON")
                    .map_err(map_rq_err)?;
                conn.pragma_update(None, "busy_timeout", 5000)
                    .map_err(map_rq_err)?;
                migrations::run_migrations(conn)?;
                Ok(())
            })
            .await
            .map_err(|e| CorvoError::Storage {
                source: Box::new(e),
            })
    }

    /// Returns the underlying connection for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Flush the WAL and leave the database in a clean state.
    ///
    /// The background writer thread itself is released when the last clone
    /// of this handle is dropped.
    pub async fn close(&self) -> Result<(), CorvoError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Map a tokio-rusqlite error into the workspace error type.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> CorvoError {
    CorvoError::Storage {
        source: Box::new(e),
    }
}

/// Map a bare rusqlite error into the workspace error type.
pub(crate) fn map_rq_err(e: rusqlite::Error) -> CorvoError {
    CorvoError::Storage {
        source: Box::new(e),
    }
}
