//! API error taxonomy and response mapping.
//!
//! Every rejection carries a machine-distinguishable status class plus a
//! short human message localized across the three supported languages.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::security::rate_limit::RateVerdict;
use crate::store::document::Localized;
use crate::store::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limit exceeded")]
    RateLimited(RateVerdict),

    #[error("origin not allowed")]
    OriginRejected,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("malformed request body")]
    MalformedBody,

    #[error("request URI too long")]
    UriTooLong,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("unauthorized")]
    Unauthorized,

    /// Admin access is not configured safely in production mode.
    #[error("admin access unavailable")]
    AdminUnavailable,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: Localized,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(rename = "retryAfterSecs", skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

fn localized(ar: &str, zgh: &str, en: &str) -> Localized {
    Localized {
        ar: ar.to_string(),
        zgh: zgh.to_string(),
        en: en.to_string(),
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::OriginRejected => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MalformedBody => StatusCode::BAD_REQUEST,
            ApiError::UriTooLong => StatusCode::URI_TOO_LONG,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::AdminUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::NotInitialized) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::RateLimited(_) => "too_many_requests",
            ApiError::OriginRejected => "origin_rejected",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::MalformedBody => "malformed_body",
            ApiError::UriTooLong => "uri_too_long",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::Unauthorized => "unauthorized",
            ApiError::AdminUnavailable => "admin_unavailable",
            ApiError::Validation(_) => "validation_failed",
            ApiError::NotFound => "not_found",
            ApiError::Store(_) => "internal_error",
        }
    }

    fn message(&self) -> Localized {
        match self {
            ApiError::RateLimited(_) => localized(
                "طلبات كثيرة جدا، حاول لاحقا",
                "Aṭas n yissutar, ɛreḍ tikelt-nniḍen",
                "Too many requests, try again later",
            ),
            ApiError::OriginRejected => localized(
                "المصدر غير مسموح به",
                "Aɣbalu ur yettwasireg ara",
                "Request origin not allowed",
            ),
            ApiError::PayloadTooLarge => localized(
                "حجم الطلب كبير جدا",
                "Tabrat meqqret aṭas",
                "Request body too large",
            ),
            ApiError::MalformedBody => localized(
                "محتوى الطلب غير صالح",
                "Tabrat ur teṣḥi ara",
                "Request body is not valid",
            ),
            ApiError::UriTooLong => localized(
                "عنوان الطلب طويل جدا",
                "Tansa n ussuter ɣezzifet aṭas",
                "Request URI too long",
            ),
            ApiError::MethodNotAllowed => localized(
                "الطريقة غير مسموح بها",
                "Tarrayt ur tettwasireg ara",
                "Method not allowed",
            ),
            ApiError::Unauthorized => localized(
                "غير مصرح بالدخول",
                "Anekcum ur yettwasireg ara",
                "Unauthorized",
            ),
            ApiError::AdminUnavailable => localized(
                "لوحة الإدارة غير متاحة",
                "Taɣult n unedbal ur telli ara",
                "Admin access is not available",
            ),
            ApiError::Validation(_) => localized(
                "بعض الحقول المطلوبة ناقصة أو غير صالحة",
                "Kra n yiḥricen xuṣṣen neɣ ur ṣḥin ara",
                "Some required fields are missing or invalid",
            ),
            ApiError::NotFound => localized(
                "العنصر غير موجود",
                "Aferdis ulac-it",
                "Item not found",
            ),
            ApiError::Store(_) => localized(
                "خطأ داخلي في الخادم",
                "Tuccḍa tagensayt n uqeddac",
                "Internal server error",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(ref error) = self {
            tracing::error!(%error, "Store operation failed");
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.message(),
            detail: match &self {
                ApiError::Validation(detail) => Some(detail.clone()),
                _ => None,
            },
            retry_after_secs: match &self {
                ApiError::RateLimited(verdict) => Some(verdict.reset_secs),
                _ => None,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes_are_distinguishable() {
        assert_eq!(ApiError::OriginRejected.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::Store(StoreError::NotInitialized).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn messages_cover_all_three_languages() {
        let msg = ApiError::NotFound.message();
        assert!(!msg.ar.is_empty());
        assert!(!msg.zgh.is_empty());
        assert!(!msg.en.is_empty());
    }
}
