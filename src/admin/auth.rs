//! Admin route authentication.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::config::MIN_ADMIN_TOKEN_LEN;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Byte-wise comparison whose duration does not depend on where the
/// inputs first differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= (x ^ y) as usize;
    }
    diff == 0
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, ApiError> {
    let security = &state.config.security;

    // In production-like mode a missing or weak secret disables admin
    // access entirely instead of letting it run unprotected.
    if security.production && security.admin_token.len() < MIN_ADMIN_TOKEN_LEN {
        tracing::error!("Admin routes disabled: admin_token missing or too short");
        return Err(ApiError::AdminUnavailable);
    }
    if security.admin_token.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    match bearer_token(&request) {
        Some(token) if constant_time_eq(token.as_bytes(), security.admin_token.as_bytes()) => {
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!(path = %request.uri().path(), "Admin auth failed");
            Err(ApiError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_inputs_compare_equal() {
        assert!(constant_time_eq(b"secret-token", b"secret-token"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn different_inputs_compare_unequal() {
        assert!(!constant_time_eq(b"secret-token", b"secret-tokem"));
        assert!(!constant_time_eq(b"short", b"longer-value"));
        assert!(!constant_time_eq(b"a", b""));
    }
}
