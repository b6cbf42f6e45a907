// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald serve` command implementation.
//!
//! Resolves the execution mode, creates the storage provider and rate
//! limiter once, and hands them to the gateway until a shutdown signal
//! arrives.

use std::sync::Arc;

use herald_config::HeraldConfig;
use herald_core::HeraldError;
use herald_gateway::GatewayState;
use herald_ratelimit::build_rate_limiter;
use herald_rpc::AppRouter;
use herald_storage::StorageProvider;
use tracing::info;

use crate::shutdown;

pub async fn run_serve(config: HeraldConfig) -> Result<(), HeraldError> {
    init_tracing(&config.log.level);

    let mode = config.runtime.mode;
    info!(%mode, "starting herald serve");

    let provider = Arc::new(StorageProvider::new(mode, &config.storage));
    // Surface a bad database URL at startup instead of on the first request.
    if !mode.is_build() {
        provider.handle().await?;
    }
    let limiter = build_rate_limiter(mode, &config.rate_limit).await?;
    let router = AppRouter::new(Arc::clone(&provider), limiter, config.welcome.clone());

    let shutdown = shutdown::install_signal_handler();
    herald_gateway::start_server(&config.server, GatewayState::new(router), shutdown).await?;

    match Arc::try_unwrap(provider) {
        Ok(provider) => provider.close().await?,
        Err(_) => info!("storage provider still referenced, skipping close"),
    }
    info!("herald stopped");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("herald={log_level},tower_http={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
