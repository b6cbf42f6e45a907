// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed procedure layer for Herald.
//!
//! Transport-agnostic: the gateway hands [`AppRouter::call`] a procedure name,
//! the invocation kind, the decoded JSON input, and the request headers.

pub mod context;
pub mod identity;
pub mod middleware;
pub mod procedures;
pub mod router;

pub use context::{ContextBuilder, RequestContext};
pub use identity::extract_identifier;
pub use middleware::RateLimitLayer;
pub use procedures::Procedures;
pub use router::{AppRouter, Procedure, ProcedureKind};
