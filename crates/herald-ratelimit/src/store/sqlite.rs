// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed quota store.
//!
//! Counters live in a database file, so every process pointed at the same
//! file shares one quota. Each hit runs in an `IMMEDIATE` transaction, which
//! takes the write lock up front and makes read-evaluate-increment atomic
//! across connections.

use std::path::Path;

use async_trait::async_trait;
use herald_core::HeraldError;
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::policy::{QuotaOutcome, SlidingWindow};
use crate::store::QuotaStore;

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA busy_timeout = 5000;
    CREATE TABLE IF NOT EXISTS quota_buckets (
        key    TEXT    NOT NULL,
        bucket INTEGER NOT NULL,
        hits   INTEGER NOT NULL,
        PRIMARY KEY (key, bucket)
    );
    CREATE INDEX IF NOT EXISTS idx_quota_buckets_bucket ON quota_buckets (bucket);
";

pub struct SqliteQuotaStore {
    conn: Connection,
}

impl SqliteQuotaStore {
    /// Open (creating if needed) the quota database at `path`.
    pub async fn open(path: &Path) -> Result<Self, HeraldError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(unavailable)?;
        }
        let conn = Connection::open(path).await.map_err(unavailable)?;
        let store = Self::init(conn).await?;
        debug!(path = %path.display(), "quota store opened");
        Ok(store)
    }

    /// Private in-memory quota database, mostly for tests.
    pub async fn open_in_memory() -> Result<Self, HeraldError> {
        let conn = Connection::open_in_memory().await.map_err(unavailable)?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, HeraldError> {
        conn.call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch(SCHEMA) })
            .await
            .map_err(unavailable)?;
        Ok(Self { conn })
    }
}

fn unavailable<E>(e: E) -> HeraldError
where
    E: std::error::Error + Send + Sync + 'static,
{
    HeraldError::LimiterUnavailable { source: Box::new(e) }
}

fn bucket_hits(
    tx: &rusqlite::Transaction<'_>,
    key: &str,
    bucket: i64,
) -> Result<u64, rusqlite::Error> {
    let hits: Option<i64> = tx
        .query_row(
            "SELECT hits FROM quota_buckets WHERE key = ?1 AND bucket = ?2",
            params![key, bucket],
            |row| row.get(0),
        )
        .optional()?;
    Ok(hits.unwrap_or(0).max(0).unsigned_abs())
}

#[async_trait]
impl QuotaStore for SqliteQuotaStore {
    async fn hit(
        &self,
        key: &str,
        policy: &SlidingWindow,
        now_ms: i64,
    ) -> Result<QuotaOutcome, HeraldError> {
        let key = key.to_string();
        let policy = *policy;
        self.conn
            .call(move |conn| -> Result<QuotaOutcome, rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let bucket = policy.bucket(now_ms);
                let current = bucket_hits(&tx, &key, bucket)?;
                let previous = bucket_hits(&tx, &key, bucket - 1)?;

                let outcome = policy.evaluate(previous, current, now_ms);
                if outcome.allowed {
                    tx.execute(
                        "INSERT INTO quota_buckets (key, bucket, hits) VALUES (?1, ?2, 1)
                         ON CONFLICT (key, bucket) DO UPDATE SET hits = hits + 1",
                        params![key, bucket],
                    )?;
                }
                // Buckets older than the previous one no longer count for any key.
                tx.execute(
                    "DELETE FROM quota_buckets WHERE bucket < ?1",
                    params![bucket - 1],
                )?;
                tx.commit()?;
                Ok(outcome)
            })
            .await
            .map_err(unavailable)
    }
}
