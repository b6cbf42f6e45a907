// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the RPC layer and its backends.

pub mod rate_limit;

pub use rate_limit::RateLimiter;
