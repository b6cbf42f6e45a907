// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota stores holding per-key bucket counters.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use herald_core::HeraldError;

use crate::policy::{QuotaOutcome, SlidingWindow};

pub use memory::MemoryQuotaStore;
pub use sqlite::SqliteQuotaStore;

/// Backend owning the authoritative quota counters.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Evaluate one call for `key` at `now_ms` and count it when admitted.
    ///
    /// Read, evaluate, and increment happen atomically per key. Backend
    /// failures are reported as [`HeraldError::LimiterUnavailable`].
    async fn hit(
        &self,
        key: &str,
        policy: &SlidingWindow,
        now_ms: i64,
    ) -> Result<QuotaOutcome, HeraldError>;
}
