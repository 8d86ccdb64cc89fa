//! Request shape and size limits.
//!
//! # Responsibilities
//! - Reject oversized URIs before routing
//! - Reject disallowed HTTP methods
//! - Reject bodies declared larger than the configured ceiling
//!
//! # Design Decisions
//! - Limits checked before any body parsing (early rejection)
//! - The declared Content-Length is only a first line of defense; the
//!   payload guard re-enforces the ceiling while buffering

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::Response,
};

use crate::http::response::ApiError;
use crate::http::server::AppState;

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::POST,
    Method::PUT,
    Method::DELETE,
];

fn declared_length(request: &Request) -> Option<u64> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// First gate stage: URI length, method allow-list, declared body size.
pub async fn preflight(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, ApiError> {
    let server = &state.config.server;

    let uri_len = request.uri().to_string().len();
    if uri_len > server.max_uri_bytes {
        tracing::warn!(uri_len, "Rejected oversized URI");
        return Err(ApiError::UriTooLong);
    }

    if !ALLOWED_METHODS.contains(request.method()) {
        tracing::warn!(method = %request.method(), "Rejected disallowed method");
        return Err(ApiError::MethodNotAllowed);
    }

    if let Some(declared) = declared_length(&request) {
        if declared > server.max_body_bytes as u64 {
            tracing::warn!(declared, "Rejected oversized declared body");
            return Err(ApiError::PayloadTooLarge);
        }
    }

    Ok(next.run(request).await)
}
