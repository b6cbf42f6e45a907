// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limit middleware wrapping mutating procedures.

use std::sync::Arc;

use herald_core::{HeraldError, RateLimiter};
use tracing::{error, info};

use crate::context::RequestContext;

/// Checks the caller's quota before running the wrapped procedure.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitLayer {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Run `procedure` if `ctx.identifier` has quota left.
    ///
    /// A rejected call fails with [`HeraldError::RateLimited`]. An unreachable
    /// quota store fails with an internal error that keeps the store error as
    /// its cause. In both cases `procedure` is not invoked.
    pub async fn run<T, F, Fut>(&self, ctx: RequestContext, procedure: F) -> Result<T, HeraldError>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = Result<T, HeraldError>>,
    {
        let decision = match self.limiter.check(&ctx.identifier).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(identifier = %ctx.identifier, error = %e, "rate limit check failed");
                return Err(HeraldError::internal("rate limiting service unavailable", e));
            }
        };

        if !decision.allowed {
            info!(
                identifier = %ctx.identifier,
                limit = decision.limit,
                retry_after_secs = decision.retry_after_secs,
                "call rejected by rate limiter"
            );
            return Err(HeraldError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            });
        }
        procedure(ctx).await
    }
}
