// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window quota arithmetic.
//!
//! Time is cut into fixed buckets of one window each. The count for the
//! trailing window is estimated as the current bucket's hits plus the previous
//! bucket's hits weighted by how much of it still overlaps the trailing window
//! (rounded up, so the estimate never under-counts).

use std::time::Duration;

/// Capacity of `limit` calls per trailing `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindow {
    limit: u32,
    window_ms: i64,
}

/// Result of evaluating one call against a key's buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaOutcome {
    pub allowed: bool,
    pub remaining: u32,
    /// Epoch milliseconds at which the current bucket ends.
    pub reset_at_ms: i64,
}

impl SlidingWindow {
    /// A window shorter than one millisecond is treated as one millisecond.
    pub fn new(limit: u32, window: Duration) -> Self {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX).max(1);
        Self { limit, window_ms }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// Index of the bucket containing `now_ms`.
    pub fn bucket(&self, now_ms: i64) -> i64 {
        now_ms.div_euclid(self.window_ms)
    }

    pub fn reset_at_ms(&self, now_ms: i64) -> i64 {
        self.bucket(now_ms).saturating_add(1).saturating_mul(self.window_ms)
    }

    /// Estimated hits in the trailing window ending at `now_ms`.
    pub fn weighted_count(&self, previous: u64, current: u64, now_ms: i64) -> u64 {
        let window = self.window_ms.unsigned_abs();
        let elapsed = now_ms.rem_euclid(self.window_ms).unsigned_abs();
        let carried = previous.saturating_mul(window - elapsed).div_ceil(window);
        carried.saturating_add(current)
    }

    /// Decide whether one more call fits, given the bucket counts before it.
    pub fn evaluate(&self, previous: u64, current: u64, now_ms: i64) -> QuotaOutcome {
        let used = self.weighted_count(previous, current, now_ms);
        let limit = u64::from(self.limit);
        let allowed = used < limit;
        let remaining = if allowed { limit - used - 1 } else { 0 };
        QuotaOutcome {
            allowed,
            remaining: u32::try_from(remaining).unwrap_or(u32::MAX),
            reset_at_ms: self.reset_at_ms(now_ms),
        }
    }
}

/// Whole seconds until `reset_at_ms`, rounded up. Never negative.
pub fn retry_after_secs(reset_at_ms: i64, now_ms: i64) -> u64 {
    reset_at_ms.saturating_sub(now_ms).max(0).unsigned_abs().div_ceil(1000)
}
