// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::time::Instant;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware as axum_middleware,
    routing::get,
};
use herald_config::model::ServerConfig;
use herald_core::HeraldError;
use herald_rpc::AppRouter;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, info, info_span};

use crate::correlation::{correlation_id, correlation_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Procedure router shared by every request.
    pub router: AppRouter,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(router: AppRouter) -> Self {
        Self {
            router,
            start_time: Instant::now(),
        }
    }
}

/// Build the application router with all routes and layers.
///
/// Routes:
/// - GET /api/trpc/{procs} (queries)
/// - POST /api/trpc/{procs} (mutations)
/// - GET /api/message
/// - GET /health
pub fn build_app(state: GatewayState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                correlation_id = %correlation_id(request),
            )
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route(
            "/api/trpc/{procs}",
            get(handlers::rpc_query).post(handlers::rpc_mutation),
        )
        .route("/api/message", get(handlers::get_message))
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(trace)
        .layer(axum_middleware::from_fn(correlation_middleware))
        .layer(CorsLayer::permissive())
}

/// Bind the listener for `config.host:config.port`.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, HeraldError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| HeraldError::internal(format!("failed to bind gateway to {addr}"), e))
}

/// Serve on `listener` until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish after cancellation.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), HeraldError> {
    let addr = listener
        .local_addr()
        .map_err(|e| HeraldError::internal("failed to read listener address", e))?;
    info!(%addr, mode = %state.router.mode(), "gateway listening");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| HeraldError::internal("gateway server error", e))?;

    info!("gateway stopped");
    Ok(())
}

/// Bind and serve in one step.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), HeraldError> {
    let listener = bind(config).await?;
    serve(listener, state, shutdown).await
}
