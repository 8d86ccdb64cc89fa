//! Seed document and snapshot reconciliation.
//!
//! At startup the persisted snapshot (if any) is merged with the static
//! seed content shipped with the site. The merge is field-by-field: a
//! persisted top-level field wins only when it has the expected container
//! type, otherwise the seed value is used. This lets a hand-edited or
//! partially corrupt snapshot degrade gracefully instead of taking the
//! whole site down.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::store::document::{
    ContentDocument, Impact, NewsItem, NextIds, Project, Settings, now_millis,
};

/// Static localized content provided by the site build.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Seed {
    pub projects: Vec<Project>,
    pub news: Vec<NewsItem>,
    pub impact: Impact,
}

impl Seed {
    /// Build a fresh document from the seed alone (no snapshot on disk).
    pub fn into_document(self) -> ContentDocument {
        let mut doc = ContentDocument {
            version: 1,
            updated_at: now_millis(),
            settings: Settings::default(),
            projects: self.projects,
            news: self.news,
            impact: self.impact,
            media: Vec::new(),
            next_ids: NextIds::default(),
        };
        doc.repair_next_ids();
        doc
    }
}

fn object_field<T: DeserializeOwned>(raw: &Value, key: &str, fallback: T) -> T {
    match raw.get(key) {
        Some(v) if v.is_object() => serde_json::from_value(v.clone()).unwrap_or(fallback),
        _ => fallback,
    }
}

fn array_field<T: DeserializeOwned>(raw: &Value, key: &str, fallback: Vec<T>) -> Vec<T> {
    match raw.get(key) {
        Some(v) if v.is_array() => serde_json::from_value(v.clone()).unwrap_or(fallback),
        _ => fallback,
    }
}

/// Merge a parsed snapshot with the seed, per top-level field.
///
/// `next_ids` is handled afterwards by [`ContentDocument::repair_next_ids`],
/// which takes the max of the persisted counter and `1 + max(id)` found in
/// the corresponding collection.
pub fn merge_snapshot(raw: &Value, seed: Seed) -> ContentDocument {
    let mut doc = ContentDocument {
        version: raw.get("version").and_then(Value::as_u64).unwrap_or(1),
        updated_at: raw
            .get("updatedAt")
            .and_then(Value::as_i64)
            .unwrap_or_else(now_millis),
        settings: object_field(raw, "settings", Settings::default()),
        projects: array_field(raw, "projects", seed.projects),
        news: array_field(raw, "news", seed.news),
        impact: object_field(raw, "impact", seed.impact),
        media: array_field(raw, "media", Vec::new()),
        next_ids: object_field(raw, "nextIds", NextIds::default()),
    };
    doc.repair_next_ids();
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed_with_projects(n: u64) -> Seed {
        Seed {
            projects: (1..=n)
                .map(|id| Project {
                    id,
                    slug: format!("project-{id}"),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn fresh_seed_counts_next_ids_from_collections() {
        let doc = seed_with_projects(2).into_document();
        assert_eq!(doc.next_ids.projects, 3);
        assert_eq!(doc.next_ids.news, 1);
    }

    #[test]
    fn persisted_collections_win_over_seed() {
        let raw = json!({
            "projects": [{"id": 9, "slug": "kept"}],
        });
        let doc = merge_snapshot(&raw, seed_with_projects(2));
        assert_eq!(doc.projects.len(), 1);
        assert_eq!(doc.projects[0].slug, "kept");
        assert_eq!(doc.next_ids.projects, 10);
    }

    #[test]
    fn wrong_container_type_falls_back_to_seed() {
        let raw = json!({
            "projects": "not an array",
            "impact": [1, 2, 3],
        });
        let seed = Seed {
            impact: Impact {
                beneficiaries: 120,
                ..Default::default()
            },
            ..seed_with_projects(2)
        };
        let doc = merge_snapshot(&raw, seed);
        assert_eq!(doc.projects.len(), 2);
        assert_eq!(doc.impact.beneficiaries, 120);
    }

    #[test]
    fn stale_counter_is_repaired_against_ids() {
        let raw = json!({
            "projects": [{"id": 5, "slug": "a"}, {"id": 2, "slug": "b"}],
            "nextIds": {"projects": 2, "news": 40, "media": 1},
        });
        let doc = merge_snapshot(&raw, Seed::default());
        assert_eq!(doc.next_ids.projects, 6);
        assert_eq!(doc.next_ids.news, 40);
    }
}
