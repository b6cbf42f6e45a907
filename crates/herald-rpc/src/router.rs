// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Procedure registry and dispatch.
//!
//! [`AppRouter::call`] resolves a procedure by name, checks that it is being
//! invoked as the right kind, decodes and validates the JSON input, builds the
//! request context, applies the rate-limit middleware to mutations, and
//! returns the procedure output as JSON.

use std::sync::Arc;

use herald_config::model::WelcomeConfig;
use herald_core::{ExecutionMode, HeraldError, RateLimiter};
use herald_storage::StorageProvider;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::{debug, error};

use crate::context::ContextBuilder;
use crate::middleware::RateLimitLayer;
use crate::procedures::{AddMessageInput, GreetingInput, Procedures};

/// Registered procedure names as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum Procedure {
    Greeting,
    GetWelcomeMessage,
    AddMessage,
    ListMessages,
}

/// Queries are read-only and served over GET; mutations over POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProcedureKind {
    Query,
    Mutation,
}

impl ProcedureKind {
    pub fn http_method(self) -> &'static str {
        match self {
            Self::Query => "GET",
            Self::Mutation => "POST",
        }
    }
}

impl Procedure {
    pub const ALL: [Procedure; 4] = [
        Self::Greeting,
        Self::GetWelcomeMessage,
        Self::AddMessage,
        Self::ListMessages,
    ];

    pub fn kind(self) -> ProcedureKind {
        match self {
            Self::AddMessage => ProcedureKind::Mutation,
            Self::Greeting | Self::GetWelcomeMessage | Self::ListMessages => ProcedureKind::Query,
        }
    }

    pub fn is_rate_limited(self) -> bool {
        self.kind() == ProcedureKind::Mutation
    }
}

/// Entry point from the transport into the procedure set.
#[derive(Clone)]
pub struct AppRouter {
    contexts: ContextBuilder,
    procedures: Arc<Procedures>,
    rate_limit: RateLimitLayer,
}

impl AppRouter {
    pub fn new(
        provider: Arc<StorageProvider>,
        limiter: Arc<dyn RateLimiter>,
        welcome: WelcomeConfig,
    ) -> Self {
        Self {
            contexts: ContextBuilder::new(provider),
            procedures: Arc::new(Procedures::new(welcome)),
            rate_limit: RateLimitLayer::new(limiter),
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.contexts.mode()
    }

    /// Invoke the procedure named `path` as `kind`.
    pub async fn call(
        &self,
        path: &str,
        kind: ProcedureKind,
        input: Option<Value>,
        headers: &HeaderMap,
    ) -> Result<Value, HeraldError> {
        let result = self.dispatch(path, kind, input, headers).await;
        if let Err(e) = &result {
            if e.status_code() >= 500 {
                error!(procedure = path, error = ?e, "procedure failed");
            } else {
                debug!(procedure = path, error = %e, "procedure rejected");
            }
        }
        result
    }

    async fn dispatch(
        &self,
        path: &str,
        kind: ProcedureKind,
        input: Option<Value>,
        headers: &HeaderMap,
    ) -> Result<Value, HeraldError> {
        let procedure: Procedure = path
            .parse()
            .map_err(|_| HeraldError::ProcedureNotFound(path.to_string()))?;
        if procedure.kind() != kind {
            return Err(HeraldError::MethodNotSupported {
                path: path.to_string(),
                method: kind.http_method().to_string(),
            });
        }
        debug!(procedure = %procedure, "dispatching procedure");

        let p = &self.procedures;
        match procedure {
            Procedure::Greeting => {
                let input: GreetingInput = decode_optional(input)?;
                to_json(p.greeting(input))
            }
            Procedure::GetWelcomeMessage => {
                let ctx = self.contexts.build(headers).await?;
                to_json(p.get_welcome_message(&ctx).await?)
            }
            Procedure::ListMessages => {
                let ctx = self.contexts.build(headers).await?;
                to_json(p.list_messages(&ctx).await?)
            }
            Procedure::AddMessage => {
                let input: AddMessageInput = decode_required(input)?;
                input.validate()?;
                let ctx = self.contexts.build(headers).await?;
                let out = self
                    .rate_limit
                    .run(ctx, |ctx| async move { p.add_message(&ctx, input).await })
                    .await?;
                to_json(out)
            }
        }
    }
}

fn decode_required<T: DeserializeOwned>(input: Option<Value>) -> Result<T, HeraldError> {
    match input {
        None | Some(Value::Null) => Err(HeraldError::Validation("input is required".to_string())),
        Some(value) => {
            serde_json::from_value(value).map_err(|e| HeraldError::Validation(e.to_string()))
        }
    }
}

fn decode_optional<T: DeserializeOwned + Default>(input: Option<Value>) -> Result<T, HeraldError> {
    match input {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_json::from_value(value).map_err(|e| HeraldError::Validation(e.to_string()))
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, HeraldError> {
    serde_json::to_value(value).map_err(|e| HeraldError::internal("failed to encode response", e))
}
