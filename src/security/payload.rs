//! Structural payload defense.
//!
//! Buffers the request body under a hard byte ceiling (enforced during
//! the read, independent of the declared Content-Length) and rejects JSON
//! payloads carrying reserved key names that could corrupt internal
//! objects when merged, or nesting deep enough to be hostile.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Keys that must never appear anywhere in an object payload.
const RESERVED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Recursion ceiling for the key scan; deeper payloads are rejected.
pub const MAX_SCAN_DEPTH: u32 = 16;

/// `Err` when the value holds a reserved key or exceeds the depth bound.
pub fn ensure_safe_value(value: &Value, depth: u32) -> Result<(), ApiError> {
    if depth >= MAX_SCAN_DEPTH {
        return Err(ApiError::MalformedBody);
    }
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    return Err(ApiError::MalformedBody);
                }
                ensure_safe_value(nested, depth + 1)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                ensure_safe_value(item, depth + 1)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

/// Gate stage: buffer, size-check and structurally scan the body, then
/// hand a reconstituted request to the inner layers.
pub async fn payload_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, ApiError> {
    let scan = is_json(&request);
    let limit = state.config.server.max_body_bytes;
    let (parts, body) = request.into_parts();

    // to_bytes fails as soon as the stream exceeds the ceiling, so a
    // missing or forged Content-Length cannot smuggle a larger body.
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| ApiError::PayloadTooLarge)?;

    if scan && !bytes.is_empty() {
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|_| ApiError::MalformedBody)?;
        ensure_safe_value(&value, 0)?;
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_payloads_pass() {
        let value = json!({"title": {"ar": "مشروع"}, "tags": ["a", "b"]});
        assert!(ensure_safe_value(&value, 0).is_ok());
    }

    #[test]
    fn reserved_keys_are_rejected_at_any_depth() {
        for key in ["__proto__", "constructor", "prototype"] {
            let top = json!({ key: 1 });
            assert!(ensure_safe_value(&top, 0).is_err(), "top-level {key}");

            let nested = json!({"a": [{"b": { key: {} }}]});
            assert!(ensure_safe_value(&nested, 0).is_err(), "nested {key}");
        }
    }

    #[test]
    fn excessive_nesting_is_rejected() {
        let mut value = json!("leaf");
        for _ in 0..(MAX_SCAN_DEPTH + 1) {
            value = json!({ "k": value });
        }
        assert!(ensure_safe_value(&value, 0).is_err());
    }

    #[test]
    fn nesting_under_the_bound_passes() {
        let mut value = json!("leaf");
        for _ in 0..(MAX_SCAN_DEPTH - 2) {
            value = json!({ "k": value });
        }
        assert!(ensure_safe_value(&value, 0).is_ok());
    }
}
