// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Herald.
//!
//! Provides the error taxonomy, domain types, and the trait seams that the
//! storage, rate limiting, and RPC crates meet at.

pub mod error;
pub mod traits;
pub mod types;

pub use error::HeraldError;
pub use traits::RateLimiter;
pub use types::{ExecutionMode, Message, RateLimitDecision, WelcomeMessage};
