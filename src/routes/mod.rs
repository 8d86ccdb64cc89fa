//! Public route handlers: content reads plus the contact and newsletter
//! submission endpoints.
//!
//! Delivery of accepted submissions (mail, CRM) is handled outside this
//! service; accepted payloads are logged structurally for pickup.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::sanitize::{BotCheckFields, is_automated, text_of, text_of_capped};
use crate::store::document::{ContentDocument, now_millis};

const MAX_NAME_LEN: usize = 120;
const MAX_EMAIL_LEN: usize = 200;
const MAX_SUBJECT_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 4_000;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn health() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// Latest committed content snapshot.
pub async fn get_content(
    State(state): State<AppState>,
) -> Result<Json<Arc<ContentDocument>>, ApiError> {
    Ok(Json(state.store.read()?))
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactPayload {
    pub name: Value,
    pub email: Value,
    pub subject: Value,
    pub message: Value,
    #[serde(flatten)]
    pub bot: BotCheckFields,
}

pub async fn submit_contact(
    State(_state): State<AppState>,
    Json(payload): Json<ContactPayload>,
) -> Result<Json<Value>, ApiError> {
    if is_automated(&payload.bot, now_millis()) {
        tracing::info!(form = "contact", "Dropped automated submission");
        return Err(ApiError::Validation("submission rejected".to_string()));
    }

    let name = text_of_capped(&payload.name, MAX_NAME_LEN);
    let email = text_of_capped(&payload.email, MAX_EMAIL_LEN);
    let subject = text_of_capped(&payload.subject, MAX_SUBJECT_LEN);
    let message = text_of_capped(&payload.message, MAX_MESSAGE_LEN);

    if name.is_empty() || message.is_empty() {
        return Err(ApiError::Validation(
            "name and message are required".to_string(),
        ));
    }
    if !looks_like_email(&email) {
        return Err(ApiError::Validation("email is not valid".to_string()));
    }

    tracing::info!(form = "contact", %name, %email, %subject,
        message_len = message.len(), "Contact submission accepted");
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsletterPayload {
    pub email: Value,
    #[serde(flatten)]
    pub bot: BotCheckFields,
}

pub async fn subscribe_newsletter(
    State(_state): State<AppState>,
    Json(payload): Json<NewsletterPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if is_automated(&payload.bot, now_millis()) {
        tracing::info!(form = "newsletter", "Dropped automated submission");
        return Err(ApiError::Validation("submission rejected".to_string()));
    }

    let email = text_of(&payload.email);
    if !looks_like_email(&email) {
        return Err(ApiError::Validation("email is not valid".to_string()));
    }

    tracing::info!(form = "newsletter", %email, "Newsletter signup accepted");
    Ok((StatusCode::CREATED, Json(json!({ "ok": true }))))
}
