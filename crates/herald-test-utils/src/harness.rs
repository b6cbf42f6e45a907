// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full stack (temp SQLite database, storage
//! provider, in-memory quota store, procedure router, axum app) and drives
//! HTTP requests through it in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use herald_config::model::{OnEmptyPolicy, RateLimitConfig, StorageConfig, WelcomeConfig};
use herald_config::HeraldConfig;
use herald_core::{ExecutionMode, HeraldError, Message};
use herald_gateway::{GatewayState, build_app};
use herald_ratelimit::build_rate_limiter;
use herald_rpc::AppRouter;
use herald_storage::queries::messages;
use herald_storage::{StorageHandle, StorageProvider};
use serde_json::Value;
use tower::ServiceExt;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    mode: ExecutionMode,
    max_requests: u32,
    window_secs: u64,
    on_empty: OnEmptyPolicy,
    seed: Vec<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let defaults = RateLimitConfig::default();
        Self {
            mode: ExecutionMode::Serving,
            max_requests: defaults.max_requests,
            window_secs: defaults.window_secs,
            on_empty: OnEmptyPolicy::Fail,
            seed: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the rate limit for mutating procedures.
    pub fn with_rate_limit(mut self, max_requests: u32, window_secs: u64) -> Self {
        self.max_requests = max_requests;
        self.window_secs = window_secs;
        self
    }

    pub fn with_on_empty(mut self, policy: OnEmptyPolicy) -> Self {
        self.on_empty = policy;
        self
    }

    /// Messages inserted (in order) before the harness is returned.
    pub fn with_messages<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed = texts.into_iter().map(Into::into).collect();
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, HeraldError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| HeraldError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("herald.db");

        let mut config = HeraldConfig::default();
        config.runtime.mode = self.mode;
        config.storage = StorageConfig {
            database_url: Some(format!("sqlite://{}", db_path.display())),
        };
        config.rate_limit = RateLimitConfig {
            max_requests: self.max_requests,
            window_secs: self.window_secs,
            ..RateLimitConfig::default()
        };
        config.welcome = WelcomeConfig {
            on_empty: self.on_empty,
            ..WelcomeConfig::default()
        };

        let provider = Arc::new(StorageProvider::new(self.mode, &config.storage));
        let limiter = build_rate_limiter(self.mode, &config.rate_limit).await?;
        let router = AppRouter::new(Arc::clone(&provider), limiter, config.welcome.clone());

        let harness = TestHarness {
            config,
            provider,
            router,
            _temp_dir: temp_dir,
        };
        if !self.seed.is_empty() {
            let StorageHandle::Live(db) = harness.provider.handle().await? else {
                return Err(HeraldError::Config(
                    "cannot seed messages in build mode".to_string(),
                ));
            };
            for text in &self.seed {
                messages::insert_message(&db, text).await?;
            }
        }
        Ok(harness)
    }
}

/// Status, headers, and decoded JSON body of one response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Null` for an empty body.
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A complete test environment backed by a temp database.
pub struct TestHarness {
    /// Effective configuration the stack was built from.
    pub config: HeraldConfig,
    /// Storage provider shared with the router.
    pub provider: Arc<StorageProvider>,
    /// Procedure router, callable directly without HTTP.
    pub router: AppRouter,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Fresh axum app over this harness's router.
    pub fn app(&self) -> Router {
        build_app(GatewayState::new(self.router.clone()))
    }

    /// Send `request` through the full HTTP stack.
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse, HeraldError> {
        let response = self
            .app()
            .oneshot(request)
            .await
            .map_err(|e| HeraldError::internal("request failed", e))?;
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| HeraldError::internal("failed to read response body", e))?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok(TestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// GET `uri` with an optional `x-forwarded-for` client address.
    pub async fn get(&self, uri: &str, client: Option<&str>) -> Result<TestResponse, HeraldError> {
        let request = request_builder("GET", uri, client)
            .body(Body::empty())
            .map_err(|e| HeraldError::internal("failed to build request", e))?;
        self.send(request).await
    }

    /// POST `body` as JSON to `uri` with an optional client address.
    pub async fn post_json(
        &self,
        uri: &str,
        body: &Value,
        client: Option<&str>,
    ) -> Result<TestResponse, HeraldError> {
        let request = request_builder("POST", uri, client)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .map_err(|e| HeraldError::internal("failed to build request", e))?;
        self.send(request).await
    }

    /// All stored messages, newest first. Empty in build mode.
    pub async fn stored_messages(&self) -> Result<Vec<Message>, HeraldError> {
        match self.provider.handle().await? {
            StorageHandle::Live(db) => messages::list_messages(&db).await,
            StorageHandle::Offline => Ok(Vec::new()),
        }
    }
}

fn request_builder(method: &str, uri: &str, client: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match client {
        Some(ip) => builder.header("x-forwarded-for", ip),
        None => builder,
    }
}
