// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles GET/POST /api/trpc/{procs}, GET /api/message, GET /health.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::future::join_all;
use herald_core::HeraldError;
use herald_rpc::ProcedureKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{self, Call};
use crate::server::GatewayState;

/// Query string of the RPC endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RpcParams {
    /// `1` or `true` enables batch mode.
    #[serde(default)]
    pub batch: Option<String>,
    /// URL-encoded JSON input (queries only).
    #[serde(default)]
    pub input: Option<String>,
}

impl RpcParams {
    fn is_batch(&self) -> bool {
        matches!(self.batch.as_deref(), Some("1" | "true"))
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub mode: String,
    pub uptime_secs: u64,
}

/// Error body for the plain REST route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /api/trpc/{procs}
pub async fn rpc_query(
    State(state): State<GatewayState>,
    Path(procs): Path<String>,
    Query(params): Query<RpcParams>,
    headers: HeaderMap,
) -> Response {
    let input = envelope::parse_input(params.input.as_deref());
    run_calls(&state, &procs, ProcedureKind::Query, params.is_batch(), input, &headers).await
}

/// POST /api/trpc/{procs}
pub async fn rpc_mutation(
    State(state): State<GatewayState>,
    Path(procs): Path<String>,
    Query(params): Query<RpcParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let input = std::str::from_utf8(&body)
        .map_err(|e| HeraldError::Validation(format!("body is not UTF-8: {e}")))
        .and_then(|text| envelope::parse_input(Some(text)));
    run_calls(&state, &procs, ProcedureKind::Mutation, params.is_batch(), input, &headers).await
}

async fn run_calls(
    state: &GatewayState,
    procs: &str,
    kind: ProcedureKind,
    batch: bool,
    input: Result<Option<Value>, HeraldError>,
    headers: &HeaderMap,
) -> Response {
    let calls = match input.and_then(|input| envelope::split_calls(procs, batch, input)) {
        Ok(calls) => calls,
        Err(e) => {
            // A malformed envelope fails every named call the same way.
            let paths: Vec<&str> = if batch { procs.split(',').collect() } else { vec![procs] };
            let results: Vec<_> = paths
                .into_iter()
                .map(|p| (p.to_string(), Err(HeraldError::Validation(e.public_message()))))
                .collect();
            return respond(&results, batch);
        }
    };

    let results = join_all(calls.into_iter().map(|Call { path, input }| async move {
        let result = state.router.call(&path, kind, input, headers).await;
        (path, result)
    }))
    .await;
    respond(&results, batch)
}

fn respond(results: &[(String, Result<Value, HeraldError>)], batch: bool) -> Response {
    let statuses: Vec<u16> = results.iter().map(|(_, r)| envelope::status_of(r)).collect();
    let status = envelope::batch_status(&statuses);
    let mut items: Vec<Value> = results
        .iter()
        .map(|(path, result)| envelope::encode_result(path, result))
        .collect();
    let body = if batch {
        Value::Array(items)
    } else {
        items.pop().unwrap_or(Value::Null)
    };

    let retry_after = results
        .iter()
        .filter_map(|(_, r)| r.as_ref().err().and_then(HeraldError::retry_after_secs))
        .max();
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(body)).into_response();
    if status == StatusCode::TOO_MANY_REQUESTS
        && let Some(secs) = retry_after
    {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    response
}

/// GET /api/message
///
/// Plain JSON welcome message: `{text}` or `{error}`.
pub async fn get_message(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    match state
        .router
        .call("getWelcomeMessage", ProcedureKind::Query, None, &headers)
        .await
    {
        Ok(message) => (StatusCode::OK, Json(message)).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(ErrorResponse {
                    error: e.public_message(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: state.router.mode().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
