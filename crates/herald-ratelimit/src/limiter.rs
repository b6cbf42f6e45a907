// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`RateLimiter`] implementations and the startup factory.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use herald_config::model::{QuotaStoreLocation, RateLimitConfig};
use herald_core::{ExecutionMode, HeraldError, RateLimitDecision, RateLimiter};
use tracing::{debug, info, warn};

use crate::policy::{SlidingWindow, retry_after_secs};
use crate::store::{MemoryQuotaStore, QuotaStore, SqliteQuotaStore};

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self(AtomicI64::new(now_ms))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sliding-window limiter over a [`QuotaStore`].
///
/// Keys are namespaced as `<prefix>:<identifier>` so several deployments can
/// share one store.
pub struct SlidingWindowLimiter {
    store: Arc<dyn QuotaStore>,
    policy: SlidingWindow,
    prefix: String,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    pub fn new(store: Arc<dyn QuotaStore>, policy: SlidingWindow, prefix: impl Into<String>) -> Self {
        Self {
            store,
            policy,
            prefix: prefix.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &SlidingWindow {
        &self.policy
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn check(&self, identifier: &str) -> Result<RateLimitDecision, HeraldError> {
        let key = format!("{}:{identifier}", self.prefix);
        let now_ms = self.clock.now_ms();
        let outcome = self
            .store
            .hit(&key, &self.policy, now_ms)
            .await
            .inspect_err(|e| warn!(key = %key, error = %e, "quota store check failed"))?;

        let retry_after_secs = if outcome.allowed {
            0
        } else {
            retry_after_secs(outcome.reset_at_ms, now_ms)
        };
        if !outcome.allowed {
            debug!(key = %key, retry_after_secs, "rate limit exceeded");
        }
        Ok(RateLimitDecision {
            allowed: outcome.allowed,
            limit: self.policy.limit(),
            remaining: outcome.remaining,
            retry_after_secs,
        })
    }
}

/// Limiter that admits everything. Used for build passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn check(&self, _identifier: &str) -> Result<RateLimitDecision, HeraldError> {
        Ok(RateLimitDecision::unlimited())
    }
}

/// Build the process-wide limiter from configuration.
///
/// Build passes get [`Unlimited`] and never touch a quota store.
pub async fn build_rate_limiter(
    mode: ExecutionMode,
    config: &RateLimitConfig,
) -> Result<Arc<dyn RateLimiter>, HeraldError> {
    if mode.is_build() {
        info!("rate limiting disabled for build pass");
        return Ok(Arc::new(Unlimited));
    }

    let location: QuotaStoreLocation = config
        .store_url
        .parse()
        .map_err(|e| HeraldError::Config(format!("rate_limit.store_url: {e}")))?;
    let store: Arc<dyn QuotaStore> = match &location {
        QuotaStoreLocation::Memory => Arc::new(MemoryQuotaStore::new()),
        QuotaStoreLocation::Sqlite(path) => Arc::new(SqliteQuotaStore::open(path).await?),
    };
    let policy = SlidingWindow::new(config.max_requests, Duration::from_secs(config.window_secs));
    info!(
        store = ?location,
        limit = config.max_requests,
        window_secs = config.window_secs,
        "rate limiter ready"
    );
    Ok(Arc::new(SlidingWindowLimiter::new(
        store,
        policy,
        config.prefix.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use crate::policy::QuotaOutcome;

    use super::*;

    struct BrokenStore;

    #[async_trait]
    impl QuotaStore for BrokenStore {
        async fn hit(
            &self,
            _key: &str,
            _policy: &SlidingWindow,
            _now_ms: i64,
        ) -> Result<QuotaOutcome, HeraldError> {
            Err(HeraldError::LimiterUnavailable {
                source: "connection refused".into(),
            })
        }
    }

    fn limiter(limit: u32, clock: Arc<ManualClock>) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(
            Arc::new(MemoryQuotaStore::new()),
            SlidingWindow::new(limit, Duration::from_secs(10)),
            "@herald/ratelimit",
        )
        .with_clock(clock)
    }

    #[tokio::test]
    async fn eleventh_call_in_window_is_denied() {
        let clock = Arc::new(ManualClock::new(1_000));
        let limiter = limiter(10, Arc::clone(&clock));
        for _ in 0..10 {
            assert!(limiter.check("1.2.3.4").await.unwrap().allowed);
        }
        let denied = limiter.check("1.2.3.4").await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.limit, 10);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.retry_after_secs, 9);
    }

    #[tokio::test]
    async fn identifiers_have_separate_quotas() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(1, clock);
        assert!(limiter.check("1.2.3.4").await.unwrap().allowed);
        assert!(!limiter.check("1.2.3.4").await.unwrap().allowed);
        assert!(limiter.check("5.6.7.8").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn quota_recovers_once_window_slides_past() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(2, Arc::clone(&clock));
        limiter.check("ip").await.unwrap();
        limiter.check("ip").await.unwrap();
        assert!(!limiter.check("ip").await.unwrap().allowed);

        clock.advance(Duration::from_secs(20));
        assert!(limiter.check("ip").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn retry_after_counts_down_with_time() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(1, Arc::clone(&clock));
        limiter.check("ip").await.unwrap();
        clock.set(8_500);
        let denied = limiter.check("ip").await.unwrap();
        assert_eq!(denied.retry_after_secs, 2);
    }

    #[tokio::test]
    async fn store_failure_is_not_a_decision() {
        let limiter = SlidingWindowLimiter::new(
            Arc::new(BrokenStore),
            SlidingWindow::new(10, Duration::from_secs(10)),
            "p",
        );
        let err = limiter.check("ip").await.unwrap_err();
        assert!(matches!(err, HeraldError::LimiterUnavailable { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn build_mode_limiter_admits_everything() {
        let config = RateLimitConfig {
            max_requests: 1,
            ..RateLimitConfig::default()
        };
        let limiter = build_rate_limiter(ExecutionMode::Build, &config).await.unwrap();
        for _ in 0..5 {
            assert!(limiter.check("ip").await.unwrap().allowed);
        }
    }

    #[tokio::test]
    async fn serving_limiter_enforces_configured_limit() {
        let config = RateLimitConfig {
            max_requests: 2,
            ..RateLimitConfig::default()
        };
        let limiter = build_rate_limiter(ExecutionMode::Serving, &config).await.unwrap();
        assert!(limiter.check("ip").await.unwrap().allowed);
        assert!(limiter.check("ip").await.unwrap().allowed);
        assert!(!limiter.check("ip").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn sqlite_store_url_opens_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota").join("limits.db");
        let config = RateLimitConfig {
            store_url: format!("sqlite://{}", path.display()),
            ..RateLimitConfig::default()
        };
        let limiter = build_rate_limiter(ExecutionMode::Serving, &config).await.unwrap();
        assert!(limiter.check("ip").await.unwrap().allowed);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn unknown_store_url_is_a_configuration_error() {
        let config = RateLimitConfig {
            store_url: "redis://localhost".to_string(),
            ..RateLimitConfig::default()
        };
        let result = build_rate_limiter(ExecutionMode::Serving, &config).await;
        assert!(matches!(result, Err(HeraldError::Config(_))));
    }
}
