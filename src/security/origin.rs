//! Origin policy for mutation routes.
//!
//! Browser-originated mutations must come from a configured origin. When
//! the `Origin` header is absent a derived origin from `Referer` is
//! accepted instead; requests with neither are admitted only when the
//! `allow_no_origin` escape hatch is configured for trusted non-browser
//! clients.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;
use crate::http::response::ApiError;
use crate::http::server::AppState;

fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// `scheme://host[:port]` of a Referer URL, if it parses.
fn origin_of_referer(referer: &str) -> Option<String> {
    let parsed = url::Url::parse(referer).ok()?;
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };
    Some(origin)
}

/// Decide whether a mutating request's provenance is acceptable.
///
/// The `allow_no_origin` escape hatch covers requests carrying neither
/// header. A Referer that is present but yields no origin is a malformed
/// claim and is rejected outright.
pub fn origin_allowed(headers: &HeaderMap, config: &SecurityConfig) -> bool {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());

    let claimed = match (origin, referer) {
        (Some(origin), _) => origin.to_string(),
        (None, Some(referer)) => match origin_of_referer(referer) {
            Some(derived) => derived,
            None => return false,
        },
        (None, None) => return config.allow_no_origin,
    };

    let claimed = normalize_origin(&claimed);
    config
        .allowed_origins
        .iter()
        .any(|allowed| normalize_origin(allowed) == claimed)
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Gate stage: origin check on mutating methods only.
pub async fn origin_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, ApiError> {
    if is_mutating(request.method()) && !origin_allowed(request.headers(), &state.config.security) {
        let origin = request
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("<none>");
        tracing::warn!(origin, path = %request.uri().path(), "Rejected by origin policy");
        return Err(ApiError::OriginRejected);
    }
    Ok(next.run(request).await)
}
