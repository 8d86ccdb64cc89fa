//! Slug derivation and collection-unique slug resolution.

use crate::store::document::{Slugged, now_millis};

/// Longest slug we will store.
pub const MAX_SLUG_LEN: usize = 80;

/// Lowercase, keep `[a-z0-9 -]`, whitespace to hyphens, collapse repeated
/// hyphens, trim, cap.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept: String = lowered
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut last_hyphen = true; // suppress leading hyphens
    for c in kept.chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' {
            if !last_hyphen {
                slug.push('-');
            }
            last_hyphen = true;
        } else {
            slug.push(c);
            last_hyphen = false;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug.chars().take(MAX_SLUG_LEN).collect()
}

fn is_valid_slug(candidate: &str) -> bool {
    !candidate.is_empty() && slugify(candidate) == candidate
}

fn taken<T: Slugged>(items: &[T], candidate: &str, exclude_id: Option<u64>) -> bool {
    items
        .iter()
        .any(|item| item.slug() == candidate && Some(item.id()) != exclude_id)
}

/// Resolve a slug that is unique within `items`.
///
/// Prefers `requested` when it is already in slug form, else derives one
/// from `fallback_text`, else a timestamp placeholder. Appends an
/// incrementing numeric suffix until no other entity (excluding
/// `exclude_id`, for in-place updates) shares the slug.
pub fn resolve_unique_slug<T: Slugged>(
    items: &[T],
    requested: &str,
    fallback_text: &str,
    exclude_id: Option<u64>,
) -> String {
    let base = if is_valid_slug(requested) {
        requested.to_string()
    } else {
        let derived = slugify(fallback_text);
        if derived.is_empty() {
            format!("entry-{}", now_millis())
        } else {
            derived
        }
    };

    if !taken(items, &base, exclude_id) {
        return base;
    }
    let mut suffix = 2u64;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken(items, &candidate, exclude_id) {
            return candidate;
        }
        suffix += 1;
    }
}
