// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate limiter trait consumed by the procedure middleware.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::types::RateLimitDecision;

/// Quota check keyed by caller identifier.
///
/// Implementations count the call as part of the check (check-and-increment
/// is atomic from the caller's point of view). A failure of the backing store
/// must surface as [`HeraldError::LimiterUnavailable`], never as an
/// allow or deny decision.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, identifier: &str) -> Result<RateLimitDecision, HeraldError>;
}
