// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window rate limiting for Herald procedures.
//!
//! A [`SlidingWindowLimiter`] keys quotas by caller identifier and keeps the
//! counters in a [`QuotaStore`]: process memory for single instances, or a
//! shared SQLite file when several server processes must agree on one quota.

pub mod limiter;
pub mod policy;
pub mod store;

pub use limiter::{Clock, ManualClock, SlidingWindowLimiter, SystemClock, Unlimited, build_rate_limiter};
pub use policy::{QuotaOutcome, SlidingWindow};
pub use store::{MemoryQuotaStore, QuotaStore, SqliteQuotaStore};
