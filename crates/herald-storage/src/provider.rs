// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage handle provider.
//!
//! One [`StorageProvider`] is created at process start and shared by `Arc`.
//! In serving mode it opens the database on first use and hands the same
//! handle to every caller afterwards. In build mode it never connects and
//! hands out [`StorageHandle::Offline`] instead.

use std::sync::Arc;

use herald_config::model::{DatabaseLocation, StorageConfig};
use herald_core::{ExecutionMode, HeraldError};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::database::Database;

/// Handle passed to procedures through the request context.
#[derive(Clone)]
pub enum StorageHandle {
    /// A live, migrated database shared by all requests.
    Live(Arc<Database>),
    /// Placeholder used during build passes; never queried.
    Offline,
}

impl std::fmt::Debug for StorageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live(_) => f.write_str("StorageHandle::Live"),
            Self::Offline => f.write_str("StorageHandle::Offline"),
        }
    }
}

/// Lazily constructs and caches the process-wide database handle.
pub struct StorageProvider {
    mode: ExecutionMode,
    database_url: Option<String>,
    db: OnceCell<Arc<Database>>,
}

impl StorageProvider {
    /// Create a provider. Nothing is opened until [`handle`](Self::handle).
    pub fn new(mode: ExecutionMode, config: &StorageConfig) -> Self {
        Self {
            mode,
            database_url: config.database_url.clone(),
            db: OnceCell::new(),
        }
    }

    /// Create a serving-mode provider around an already opened database.
    pub fn with_database(db: Database) -> Self {
        Self {
            mode: ExecutionMode::Serving,
            database_url: None,
            db: OnceCell::new_with(Some(Arc::new(db))),
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Return the shared handle, opening the database on first call.
    ///
    /// Concurrent first calls wait on the same initialization, so the
    /// database is opened at most once. A failed open is returned as is and
    /// not cached, so a later call opens afresh.
    pub async fn handle(&self) -> Result<StorageHandle, HeraldError> {
        if self.mode.is_build() {
            return Ok(StorageHandle::Offline);
        }
        let db = self.db.get_or_try_init(|| self.connect()).await?;
        Ok(StorageHandle::Live(Arc::clone(db)))
    }

    async fn connect(&self) -> Result<Arc<Database>, HeraldError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or_else(|| HeraldError::Config("storage.database_url is not set".to_string()))?;
        let location: DatabaseLocation = url
            .parse()
            .map_err(|e| HeraldError::Config(format!("storage.database_url: {e}")))?;

        let db = match &location {
            DatabaseLocation::File(path) => Database::open(path).await?,
            DatabaseLocation::Memory => Database::open_in_memory().await?,
        };
        info!(location = ?location, "storage connection opened");
        Ok(Arc::new(db))
    }

    /// Checkpoint and close the database if no handle is still in use.
    pub async fn close(self) -> Result<(), HeraldError> {
        let Some(db) = self.db.into_inner() else {
            return Ok(());
        };
        match Arc::try_unwrap(db) {
            Ok(db) => db.close().await,
            Err(_) => {
                debug!("storage handle still shared, leaving connection open");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use tracing::Instrument;
    use tracing_test::traced_test;

    use super::*;

    fn config(url: Option<&str>) -> StorageConfig {
        StorageConfig {
            database_url: url.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn missing_url_is_a_configuration_error() {
        let provider = StorageProvider::new(ExecutionMode::Serving, &config(None));
        let err = provider.handle().await.unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_url_is_a_configuration_error() {
        let provider =
            StorageProvider::new(ExecutionMode::Serving, &config(Some("postgres://db/herald")));
        let err = provider.handle().await.unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn build_mode_never_connects() {
        // Even a missing URL is fine: build passes must not touch storage.
        let provider = StorageProvider::new(ExecutionMode::Build, &config(None));
        let handle = provider.handle().await.unwrap();
        assert!(matches!(handle, StorageHandle::Offline));
    }

    #[tokio::test]
    async fn repeated_calls_share_one_database() {
        let provider =
            StorageProvider::new(ExecutionMode::Serving, &config(Some("sqlite::memory:")));
        let (StorageHandle::Live(a), StorageHandle::Live(b)) =
            (provider.handle().await.unwrap(), provider.handle().await.unwrap())
        else {
            panic!("expected live handles");
        };
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn failed_open_is_reported_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let url = format!("sqlite://{}", blocker.join("herald.db").display());
        let provider = StorageProvider::new(ExecutionMode::Serving, &config(Some(&url)));

        let err = provider.handle().await.unwrap_err();
        assert!(matches!(err, HeraldError::Storage { .. }), "got {err:?}");

        std::fs::remove_file(&blocker).unwrap();
        assert!(matches!(provider.handle().await.unwrap(), StorageHandle::Live(_)));
    }

    #[tokio::test]
    async fn close_releases_unshared_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("herald.db").display());
        let provider = StorageProvider::new(ExecutionMode::Serving, &config(Some(&url)));
        let handle = provider.handle().await.unwrap();
        drop(handle);
        provider.close().await.unwrap();

        let never_opened = StorageProvider::new(ExecutionMode::Build, &config(None));
        never_opened.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[traced_test]
    async fn concurrent_first_use_opens_once() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("herald.db").display());
        let provider = Arc::new(StorageProvider::new(
            ExecutionMode::Serving,
            &config(Some(&url)),
        ));

        let tasks = (0..16).map(|_| {
            let provider = Arc::clone(&provider);
            // Keep the test span so the log capture sees spawned events.
            tokio::spawn(async move { provider.handle().await }.in_current_span())
        });
        let handles: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| match joined.unwrap().unwrap() {
                StorageHandle::Live(db) => db,
                StorageHandle::Offline => panic!("serving mode returned offline handle"),
            })
            .collect();

        assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("storage connection opened"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one connection log line, found {n}")),
            }
        });
    }
}
