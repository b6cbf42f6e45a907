// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process quota store backed by a sharded concurrent map.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use herald_core::HeraldError;

use crate::policy::{QuotaOutcome, SlidingWindow};
use crate::store::QuotaStore;

/// Hits between sweeps of keys idle for more than one window.
const SWEEP_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy, Default)]
struct Buckets {
    bucket: i64,
    current: u64,
    previous: u64,
}

impl Buckets {
    /// Advance to `bucket`. A clock step backwards keeps the newer bucket.
    fn roll_to(&mut self, bucket: i64) {
        match bucket.saturating_sub(self.bucket) {
            d if d <= 0 => return,
            1 => self.previous = self.current,
            _ => self.previous = 0,
        }
        self.current = 0;
        self.bucket = bucket;
    }
}

/// Quota counters held in memory. Counts are lost on restart and are not
/// shared between processes.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    keys: DashMap<String, Buckets>,
    hits: AtomicU64,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn sweep(&self, bucket: i64) {
        self.keys.retain(|_, b| b.bucket >= bucket.saturating_sub(1));
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn hit(
        &self,
        key: &str,
        policy: &SlidingWindow,
        now_ms: i64,
    ) -> Result<QuotaOutcome, HeraldError> {
        let bucket = policy.bucket(now_ms);
        // Must run before taking the entry guard below.
        if self.hits.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep(bucket);
        }

        let mut entry = self.keys.entry(key.to_string()).or_insert(Buckets {
            bucket,
            ..Buckets::default()
        });
        entry.roll_to(bucket);
        let outcome = policy.evaluate(entry.previous, entry.current, now_ms);
        if outcome.allowed {
            entry.current += 1;
        }
        Ok(outcome)
    }
}
