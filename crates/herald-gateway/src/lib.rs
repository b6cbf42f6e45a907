// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for Herald.
//!
//! Exposes the procedure router over a tRPC-compatible batched endpoint,
//! plus a plain REST welcome-message route and a health check. Every response
//! carries an `x-correlation-id`.

pub mod correlation;
pub mod envelope;
pub mod handlers;
pub mod server;

pub use server::{GatewayState, bind, build_app, serve, start_server};
