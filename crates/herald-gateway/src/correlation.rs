// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request correlation ids.
//!
//! Every request gets an `x-correlation-id`. A caller-supplied UUID is kept;
//! anything else is replaced with a fresh v4. The id is written to the request
//! (so the trace span can record it) and echoed on the response.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

pub async fn correlation_middleware(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    // A hyphenated UUID is always a valid header value.
    let value = HeaderValue::from_str(&id.hyphenated().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("invalid"));

    request
        .headers_mut()
        .insert(CORRELATION_HEADER, value.clone());
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(CORRELATION_HEADER, value);
    response
}

/// Correlation id recorded on `request`, or `-` before the middleware ran.
pub fn correlation_id<B>(request: &axum::http::Request<B>) -> &str {
    request
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}
