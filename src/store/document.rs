//! Persistent content document and entity definitions.
//!
//! This module defines the complete on-disk document structure. All types
//! derive Serde traits; the snapshot serializes to a single JSON document
//! with camelCase keys so a round trip reproduces an equal document.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Text localized across the three supported languages.
///
/// Missing languages are always empty strings, never absent, so the
/// frontend can index any language without presence checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Localized {
    pub ar: String,
    pub zgh: String,
    pub en: String,
}

impl Localized {
    pub fn is_empty(&self) -> bool {
        self.ar.is_empty() && self.zgh.is_empty() && self.en.is_empty()
    }
}

/// A per-language list of short text items (e.g. donation instructions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizedList {
    pub ar: Vec<String>,
    pub zgh: Vec<String>,
    pub en: Vec<String>,
}

/// Entities that live in a slug-addressed collection.
pub trait Slugged {
    fn id(&self) -> u64;
    fn slug(&self) -> &str;
}

/// A long-running association project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub slug: String,
    pub title: Localized,
    pub summary: Localized,
    pub body: Localized,
    pub image_url: String,
    pub published_at: i64,
}

/// A dated news entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsItem {
    pub id: u64,
    pub slug: String,
    pub title: Localized,
    pub summary: Localized,
    pub body: Localized,
    pub image_url: String,
    pub published_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

/// A gallery entry (photo or video link).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaItem {
    pub id: u64,
    pub slug: String,
    pub title: Localized,
    pub url: String,
    pub kind: MediaKind,
}

impl Slugged for Project {
    fn id(&self) -> u64 {
        self.id
    }
    fn slug(&self) -> &str {
        &self.slug
    }
}

impl Slugged for NewsItem {
    fn id(&self) -> u64 {
        self.id
    }
    fn slug(&self) -> &str {
        &self.slug
    }
}

impl Slugged for MediaItem {
    fn id(&self) -> u64 {
        self.id
    }
    fn slug(&self) -> &str {
        &self.slug
    }
}

/// Aggregate impact figures shown on the landing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Impact {
    pub beneficiaries: u64,
    pub projects_completed: u64,
    pub volunteers: u64,
    pub regions: u64,
}

/// Social media links. Empty string means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub facebook: String,
    pub instagram: String,
    pub youtube: String,
    pub twitter: String,
}

/// Bank details for donations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DonationInfo {
    pub bank_name: Localized,
    pub account_number: String,
    pub note: Localized,
    /// Step-by-step donation instructions shown on the donate page.
    pub instructions: LocalizedList,
}

/// Legal registration metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegalInfo {
    pub association_name: Localized,
    pub registration_number: String,
}

/// Site-wide editable settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub hero_title: Localized,
    pub hero_subtitle: Localized,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: Localized,
    pub social: SocialLinks,
    pub donation: DonationInfo,
    pub legal: LegalInfo,
}

/// Per-collection monotonic id counters.
///
/// Invariant: `next_ids[kind] > max(id)` over the matching collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NextIds {
    pub projects: u64,
    pub news: u64,
    pub media: u64,
}

impl Default for NextIds {
    fn default() -> Self {
        Self {
            projects: 1,
            news: 1,
            media: 1,
        }
    }
}

/// The whole persisted document. One per process, one per site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentDocument {
    pub version: u64,
    pub updated_at: i64,
    pub settings: Settings,
    pub projects: Vec<Project>,
    pub news: Vec<NewsItem>,
    pub impact: Impact,
    pub media: Vec<MediaItem>,
    pub next_ids: NextIds,
}

fn repaired_counter<T: Slugged>(counter: u64, items: &[T]) -> u64 {
    let floor = items.iter().map(Slugged::id).max().map_or(1, |m| m + 1);
    counter.max(floor)
}

impl ContentDocument {
    /// Re-establish the `next_ids` invariant against the current
    /// collections. Guards against hand-edited or stale snapshots and
    /// against mutators that forget to bump a counter.
    pub fn repair_next_ids(&mut self) {
        self.next_ids.projects = repaired_counter(self.next_ids.projects, &self.projects);
        self.next_ids.news = repaired_counter(self.next_ids.news, &self.news);
        self.next_ids.media = repaired_counter(self.next_ids.media, &self.media);
    }
}
