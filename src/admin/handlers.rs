//! Admin mutation handlers.
//!
//! Every handler follows the same shape: sanitize and validate the
//! payload first, then apply it inside one `ContentStore::update` call so
//! the mutation is all-or-nothing. Validation failures never touch the
//! draft; `NotFound` aborts the commit before anything is persisted.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::sanitize::{
    LocalizedInput, LocalizedListInput, localized_list, localized_text, resolve_unique_slug,
    sanitize_url, text_of, text_of_capped,
};
use crate::store::document::{
    ContentDocument, Impact, Localized, MediaItem, MediaKind, NewsItem, Project, Settings,
    now_millis,
};

const MAX_TITLE_LEN: usize = 160;
const MAX_SUMMARY_LEN: usize = 400;
const MAX_BODY_LEN: usize = 8_000;
const MAX_SHORT_LEN: usize = 200;
const MAX_INSTRUCTIONS: usize = 10;

/// Shared payload shape for projects and news entries.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArticlePayload {
    pub slug: Value,
    pub title: LocalizedInput,
    pub summary: LocalizedInput,
    pub body: LocalizedInput,
    pub image_url: Value,
    pub published_at: Option<i64>,
}

struct ArticleFields {
    slug_request: String,
    title: Localized,
    summary: Localized,
    body: Localized,
    image_url: String,
    published_at: i64,
}

impl ArticleFields {
    fn slug_fallback(&self) -> &str {
        if !self.title.en.is_empty() {
            &self.title.en
        } else if !self.title.zgh.is_empty() {
            &self.title.zgh
        } else {
            &self.title.ar
        }
    }
}

fn article_fields(payload: &ArticlePayload) -> Result<ArticleFields, ApiError> {
    let title = localized_text(&payload.title, MAX_TITLE_LEN);
    if title.is_empty() {
        return Err(ApiError::Validation(
            "title is required in at least one language".to_string(),
        ));
    }
    Ok(ArticleFields {
        slug_request: text_of(&payload.slug),
        title,
        summary: localized_text(&payload.summary, MAX_SUMMARY_LEN),
        body: localized_text(&payload.body, MAX_BODY_LEN),
        image_url: sanitize_url(&payload.image_url),
        published_at: payload.published_at.unwrap_or_else(now_millis),
    })
}

/// Full snapshot for the admin dashboard.
pub async fn get_content(
    State(state): State<AppState>,
) -> Result<Json<std::sync::Arc<ContentDocument>>, ApiError> {
    Ok(Json(state.store.read()?))
}

// ---- settings ----

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPayload {
    pub hero_title: LocalizedInput,
    pub hero_subtitle: LocalizedInput,
    pub contact_email: Value,
    pub contact_phone: Value,
    pub address: LocalizedInput,
    pub facebook: Value,
    pub instagram: Value,
    pub youtube: Value,
    pub twitter: Value,
    pub bank_name: LocalizedInput,
    pub account_number: Value,
    pub donation_note: LocalizedInput,
    pub donation_instructions: LocalizedListInput,
    pub association_name: LocalizedInput,
    pub registration_number: Value,
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<SettingsPayload>,
) -> Result<Json<Settings>, ApiError> {
    let settings = Settings {
        hero_title: localized_text(&payload.hero_title, MAX_TITLE_LEN),
        hero_subtitle: localized_text(&payload.hero_subtitle, MAX_SUMMARY_LEN),
        contact_email: text_of_capped(&payload.contact_email, MAX_SHORT_LEN),
        contact_phone: text_of_capped(&payload.contact_phone, MAX_SHORT_LEN),
        address: localized_text(&payload.address, MAX_SUMMARY_LEN),
        social: crate::store::document::SocialLinks {
            facebook: sanitize_url(&payload.facebook),
            instagram: sanitize_url(&payload.instagram),
            youtube: sanitize_url(&payload.youtube),
            twitter: sanitize_url(&payload.twitter),
        },
        donation: crate::store::document::DonationInfo {
            bank_name: localized_text(&payload.bank_name, MAX_SHORT_LEN),
            account_number: text_of_capped(&payload.account_number, MAX_SHORT_LEN),
            note: localized_text(&payload.donation_note, MAX_SUMMARY_LEN),
            instructions: localized_list(
                &payload.donation_instructions,
                MAX_INSTRUCTIONS,
                MAX_SHORT_LEN,
            ),
        },
        legal: crate::store::document::LegalInfo {
            association_name: localized_text(&payload.association_name, MAX_SHORT_LEN),
            registration_number: text_of_capped(&payload.registration_number, MAX_SHORT_LEN),
        },
    };

    let (_, settings) = state
        .store
        .update(move |draft| {
            draft.settings = settings;
            Ok::<_, ApiError>(draft.settings.clone())
        })
        .await?;
    Ok(Json(settings))
}

// ---- impact ----

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImpactPayload {
    pub beneficiaries: Value,
    pub projects_completed: Value,
    pub volunteers: Value,
    pub regions: Value,
}

fn stat_of(value: &Value) -> u64 {
    value.as_u64().unwrap_or(0)
}

pub async fn update_impact(
    State(state): State<AppState>,
    Json(payload): Json<ImpactPayload>,
) -> Result<Json<Impact>, ApiError> {
    let impact = Impact {
        beneficiaries: stat_of(&payload.beneficiaries),
        projects_completed: stat_of(&payload.projects_completed),
        volunteers: stat_of(&payload.volunteers),
        regions: stat_of(&payload.regions),
    };
    let (_, impact) = state
        .store
        .update(move |draft| {
            draft.impact = impact;
            Ok::<_, ApiError>(draft.impact)
        })
        .await?;
    Ok(Json(impact))
}

// ---- projects ----

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<ArticlePayload>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let fields = article_fields(&payload)?;
    let (_, created) = state
        .store
        .update(move |draft| {
            let id = draft.next_ids.projects;
            let slug =
                resolve_unique_slug(&draft.projects, &fields.slug_request, fields.slug_fallback(), None);
            let project = Project {
                id,
                slug,
                title: fields.title,
                summary: fields.summary,
                body: fields.body,
                image_url: fields.image_url,
                published_at: fields.published_at,
            };
            draft.projects.push(project.clone());
            draft.next_ids.projects = id + 1;
            Ok::<_, ApiError>(project)
        })
        .await?;
    tracing::info!(id = created.id, slug = %created.slug, "Project created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<ArticlePayload>,
) -> Result<Json<Project>, ApiError> {
    let fields = article_fields(&payload)?;
    let (_, updated) = state
        .store
        .update(move |draft| {
            if !draft.projects.iter().any(|p| p.id == id) {
                return Err(ApiError::NotFound);
            }
            let slug = resolve_unique_slug(
                &draft.projects,
                &fields.slug_request,
                fields.slug_fallback(),
                Some(id),
            );
            let project = draft
                .projects
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(ApiError::NotFound)?;
            project.slug = slug;
            project.title = fields.title;
            project.summary = fields.summary;
            project.body = fields.body;
            project.image_url = fields.image_url;
            project.published_at = fields.published_at;
            Ok(project.clone())
        })
        .await?;
    Ok(Json(updated))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .update(move |draft| {
            let before = draft.projects.len();
            draft.projects.retain(|p| p.id != id);
            if draft.projects.len() == before {
                return Err(ApiError::NotFound);
            }
            Ok::<_, ApiError>(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- news ----

pub async fn create_news(
    State(state): State<AppState>,
    Json(payload): Json<ArticlePayload>,
) -> Result<(StatusCode, Json<NewsItem>), ApiError> {
    let fields = article_fields(&payload)?;
    let (_, created) = state
        .store
        .update(move |draft| {
            let id = draft.next_ids.news;
            let slug =
                resolve_unique_slug(&draft.news, &fields.slug_request, fields.slug_fallback(), None);
            let item = NewsItem {
                id,
                slug,
                title: fields.title,
                summary: fields.summary,
                body: fields.body,
                image_url: fields.image_url,
                published_at: fields.published_at,
            };
            draft.news.push(item.clone());
            draft.next_ids.news = id + 1;
            Ok::<_, ApiError>(item)
        })
        .await?;
    tracing::info!(id = created.id, slug = %created.slug, "News entry created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_news(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<ArticlePayload>,
) -> Result<Json<NewsItem>, ApiError> {
    let fields = article_fields(&payload)?;
    let (_, updated) = state
        .store
        .update(move |draft| {
            if !draft.news.iter().any(|n| n.id == id) {
                return Err(ApiError::NotFound);
            }
            let slug = resolve_unique_slug(
                &draft.news,
                &fields.slug_request,
                fields.slug_fallback(),
                Some(id),
            );
            let item = draft
                .news
                .iter_mut()
                .find(|n| n.id == id)
                .ok_or(ApiError::NotFound)?;
            item.slug = slug;
            item.title = fields.title;
            item.summary = fields.summary;
            item.body = fields.body;
            item.image_url = fields.image_url;
            item.published_at = fields.published_at;
            Ok(item.clone())
        })
        .await?;
    Ok(Json(updated))
}

pub async fn delete_news(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .update(move |draft| {
            let before = draft.news.len();
            draft.news.retain(|n| n.id != id);
            if draft.news.len() == before {
                return Err(ApiError::NotFound);
            }
            Ok::<_, ApiError>(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- media ----

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaPayload {
    pub slug: Value,
    pub title: LocalizedInput,
    pub url: Value,
    pub kind: Value,
}

struct MediaFields {
    slug_request: String,
    title: Localized,
    url: String,
    kind: MediaKind,
}

fn media_fields(payload: &MediaPayload) -> Result<MediaFields, ApiError> {
    let title = localized_text(&payload.title, MAX_TITLE_LEN);
    if title.is_empty() {
        return Err(ApiError::Validation(
            "title is required in at least one language".to_string(),
        ));
    }
    let url = sanitize_url(&payload.url);
    if url.is_empty() {
        return Err(ApiError::Validation(
            "url must be an absolute http(s) URL".to_string(),
        ));
    }
    let kind = match text_of(&payload.kind).as_str() {
        "video" => MediaKind::Video,
        _ => MediaKind::Image,
    };
    Ok(MediaFields {
        slug_request: text_of(&payload.slug),
        title,
        url,
        kind,
    })
}

fn media_slug_fallback(title: &Localized) -> &str {
    if !title.en.is_empty() {
        &title.en
    } else if !title.zgh.is_empty() {
        &title.zgh
    } else {
        &title.ar
    }
}

pub async fn create_media(
    State(state): State<AppState>,
    Json(payload): Json<MediaPayload>,
) -> Result<(StatusCode, Json<MediaItem>), ApiError> {
    let fields = media_fields(&payload)?;
    let (_, created) = state
        .store
        .update(move |draft| {
            let id = draft.next_ids.media;
            let slug = resolve_unique_slug(
                &draft.media,
                &fields.slug_request,
                media_slug_fallback(&fields.title),
                None,
            );
            let item = MediaItem {
                id,
                slug,
                title: fields.title,
                url: fields.url,
                kind: fields.kind,
            };
            draft.media.push(item.clone());
            draft.next_ids.media = id + 1;
            Ok::<_, ApiError>(item)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<MediaPayload>,
) -> Result<Json<MediaItem>, ApiError> {
    let fields = media_fields(&payload)?;
    let (_, updated) = state
        .store
        .update(move |draft| {
            if !draft.media.iter().any(|m| m.id == id) {
                return Err(ApiError::NotFound);
            }
            let slug = resolve_unique_slug(
                &draft.media,
                &fields.slug_request,
                media_slug_fallback(&fields.title),
                Some(id),
            );
            let item = draft
                .media
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or(ApiError::NotFound)?;
            item.slug = slug;
            item.title = fields.title;
            item.url = fields.url;
            item.kind = fields.kind;
            Ok(item.clone())
        })
        .await?;
    Ok(Json(updated))
}

pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .update(move |draft| {
            let before = draft.media.len();
            draft.media.retain(|m| m.id != id);
            if draft.media.len() == before {
                return Err(ApiError::NotFound);
            }
            Ok::<_, ApiError>(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
