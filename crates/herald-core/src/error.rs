// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy shared by every Herald crate.
//!
//! Each variant maps to exactly one HTTP status and one RPC error code, so the
//! transport never has to inspect message strings to classify a failure.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across storage, rate limiting, and procedures.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Caller supplied bad input. Recoverable by correcting the input.
    #[error("validation error: {0}")]
    Validation(String),

    /// An expected absence, e.g. no welcome message yet.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller exceeded its quota and may retry after the given delay.
    #[error("rate limit exceeded, retry in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Missing or malformed deployment configuration. Not retryable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The quota store itself could not be reached.
    #[error("rate limiter unavailable: {source}")]
    LimiterUnavailable { source: BoxError },

    /// Raw storage backend failure (connection, query, migration).
    #[error("storage error: {source}")]
    Storage { source: BoxError },

    /// Unexpected failure with a caller-safe message and the original cause.
    #[error("internal error: {message}")]
    Internal {
        message: String,
        source: Option<BoxError>,
    },

    /// No procedure is registered under the requested name.
    #[error("no procedure found on path `{0}`")]
    ProcedureNotFound(String),

    /// The procedure exists but cannot be invoked with this HTTP method.
    #[error("unsupported method {method} for procedure `{path}`")]
    MethodNotSupported { path: String, method: String },
}

impl HeraldError {
    /// Build an `Internal` error that keeps `cause` for diagnostics.
    pub fn internal(
        message: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// HTTP status code exposed to callers.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) | Self::ProcedureNotFound(_) => 404,
            Self::MethodNotSupported { .. } => 405,
            Self::RateLimited { .. } => 429,
            Self::Config(_)
            | Self::LimiterUnavailable { .. }
            | Self::Storage { .. }
            | Self::Internal { .. } => 500,
        }
    }

    /// Symbolic RPC error code (tRPC naming).
    pub fn rpc_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "BAD_REQUEST",
            Self::NotFound(_) | Self::ProcedureNotFound(_) => "NOT_FOUND",
            Self::MethodNotSupported { .. } => "METHOD_NOT_SUPPORTED",
            Self::RateLimited { .. } => "TOO_MANY_REQUESTS",
            Self::Config(_)
            | Self::LimiterUnavailable { .. }
            | Self::Storage { .. }
            | Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    /// JSON-RPC numeric code matching [`rpc_code`](Self::rpc_code).
    pub fn json_rpc_code(&self) -> i32 {
        match self.rpc_code() {
            "BAD_REQUEST" => -32600,
            "NOT_FOUND" => -32004,
            "METHOD_NOT_SUPPORTED" => -32005,
            "TOO_MANY_REQUESTS" => -32029,
            _ => -32603,
        }
    }

    /// Message safe to show to callers.
    ///
    /// Infrastructure failures are genericized; the full error (with cause)
    /// stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
            Self::RateLimited { retry_after_secs } => {
                format!("Rate limit exceeded. Try again in {retry_after_secs} seconds.")
            }
            Self::Internal { message, .. } => message.clone(),
            Self::Config(_) => "server configuration error".to_string(),
            Self::LimiterUnavailable { .. } => "rate limiting service unavailable".to_string(),
            Self::Storage { .. } => "internal server error".to_string(),
            Self::ProcedureNotFound(_) | Self::MethodNotSupported { .. } => self.to_string(),
        }
    }

    /// Seconds the caller should wait, for rate-limited errors.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}
