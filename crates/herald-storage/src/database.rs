// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, so one [`Database`] can be shared by every request task.

use std::path::Path;

use herald_core::HeraldError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// A migrated SQLite database behind a single tokio-rusqlite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database file at `path` and migrate it.
    pub async fn open(path: &Path) -> Result<Self, HeraldError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HeraldError::Storage { source: Box::new(e) })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| HeraldError::Storage { source: Box::new(e) })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        let db = Self { conn };
        db.migrate().await?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Open a private in-memory database and migrate it.
    pub async fn open_in_memory() -> Result<Self, HeraldError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| HeraldError::Storage { source: Box::new(e) })?;
        let db = Self { conn };
        db.migrate().await?;
        Ok(db)
    }

    /// The underlying connection, for query modules.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), HeraldError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn
            .close()
            .await
            .map_err(|e| HeraldError::Storage { source: Box::new(e) })
    }

    async fn migrate(&self) -> Result<(), HeraldError> {
        self.conn
            .call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e| HeraldError::Storage { source: Box::new(e) })
    }
}

/// Map a tokio-rusqlite call error into the storage variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> HeraldError {
    HeraldError::Storage { source: Box::new(e) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("herald.db");
        let db = Database::open(&path).await.unwrap();
        assert!(path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn migrations_create_messages_table() {
        let db = Database::open_in_memory().await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'messages'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.db");
        Database::open(&path).await.unwrap().close().await.unwrap();
        let db = Database::open(&path).await.unwrap();
        db.close().await.unwrap();
    }
}
