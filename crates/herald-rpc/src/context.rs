// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-call request context.

use std::sync::Arc;

use herald_core::{ExecutionMode, HeraldError};
use herald_storage::{StorageHandle, StorageProvider};
use http::HeaderMap;

use crate::identity::extract_identifier;

/// Everything a procedure may use. Built fresh for each call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub storage: StorageHandle,
    pub identifier: String,
    pub mode: ExecutionMode,
}

/// Assembles [`RequestContext`]s from the shared storage provider.
#[derive(Clone)]
pub struct ContextBuilder {
    provider: Arc<StorageProvider>,
}

impl ContextBuilder {
    pub fn new(provider: Arc<StorageProvider>) -> Self {
        Self { provider }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.provider.mode()
    }

    /// Configuration errors from the storage provider propagate unchanged.
    pub async fn build(&self, headers: &HeaderMap) -> Result<RequestContext, HeraldError> {
        Ok(RequestContext {
            storage: self.provider.handle().await?,
            identifier: extract_identifier(headers),
            mode: self.provider.mode(),
        })
    }
}

#[cfg(test)]
mod tests {
    use herald_config::model::StorageConfig;
    use http::HeaderValue;

    use super::*;

    #[tokio::test]
    async fn build_combines_storage_and_identity() {
        let provider = StorageProvider::new(
            ExecutionMode::Serving,
            &StorageConfig {
                database_url: Some("sqlite::memory:".to_string()),
            },
        );
        let builder = ContextBuilder::new(Arc::new(provider));
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));

        let ctx = builder.build(&headers).await.unwrap();
        assert!(matches!(ctx.storage, StorageHandle::Live(_)));
        assert_eq!(ctx.identifier, "198.51.100.4");
        assert_eq!(ctx.mode, ExecutionMode::Serving);
    }

    #[tokio::test]
    async fn missing_database_url_propagates() {
        let provider = StorageProvider::new(ExecutionMode::Serving, &StorageConfig::default());
        let builder = ContextBuilder::new(Arc::new(provider));
        let err = builder.build(&HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn build_mode_context_is_offline() {
        let provider = StorageProvider::new(ExecutionMode::Build, &StorageConfig::default());
        let ctx = ContextBuilder::new(Arc::new(provider))
            .build(&HeaderMap::new())
            .await
            .unwrap();
        assert!(matches!(ctx.storage, StorageHandle::Offline));
        assert_eq!(ctx.identifier, "127.0.0.1");
    }
}
