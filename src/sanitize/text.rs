//! Text normalization for untrusted input.
//!
//! Every free-text field that reaches the store goes through these
//! functions first. They are pure and stateless.

use serde::Deserialize;
use serde_json::Value;

use crate::store::document::{Localized, LocalizedList};

/// Bidirectional override/isolate characters. Stripped so user text can
/// never reorder surrounding UI text.
const BIDI_CONTROLS: [char; 9] = [
    '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}',
    '\u{2066}', '\u{2069}',
];

/// Strip control and bidi-override characters and angle brackets, collapse
/// whitespace, trim.
pub fn normalize_text(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| {
            !BIDI_CONTROLS.contains(c)
                && *c != '<'
                && *c != '>'
                && (!c.is_control() || c.is_whitespace())
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capped(text: String, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text
    } else {
        text.chars().take(max_len).collect::<String>().trim_end().to_string()
    }
}

/// Normalize an arbitrary JSON value as text. Non-strings yield an empty
/// string rather than an error; the admin UI treats that as "unset".
pub fn text_of(value: &Value) -> String {
    value.as_str().map(normalize_text).unwrap_or_default()
}

/// Normalized, length-capped text from an arbitrary JSON value.
pub fn text_of_capped(value: &Value, max_len: usize) -> String {
    capped(text_of(value), max_len)
}

/// Untrusted localized text as it arrives in a payload. Each language is
/// an arbitrary JSON value until normalized.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalizedInput {
    pub ar: Value,
    pub zgh: Value,
    pub en: Value,
}

/// Project an arbitrary payload object onto exactly the three supported
/// languages, each normalized and capped. Missing languages become empty
/// strings.
pub fn localized_text(input: &LocalizedInput, max_len: usize) -> Localized {
    Localized {
        ar: text_of_capped(&input.ar, max_len),
        zgh: text_of_capped(&input.zgh, max_len),
        en: text_of_capped(&input.en, max_len),
    }
}

/// One language's worth of list input: either a sequence or a
/// newline-delimited block of text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    Text(String),
    Items(Vec<Value>),
    Other(Value),
}

impl Default for ListInput {
    fn default() -> Self {
        ListInput::Other(Value::Null)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalizedListInput {
    pub ar: ListInput,
    pub zgh: ListInput,
    pub en: ListInput,
}

fn list_items(input: &ListInput, max_items: usize, max_len: usize) -> Vec<String> {
    let raw: Vec<String> = match input {
        ListInput::Text(block) => block.lines().map(normalize_text).collect(),
        ListInput::Items(items) => items.iter().map(text_of).collect(),
        ListInput::Other(_) => Vec::new(),
    };
    raw.into_iter()
        .filter(|item| !item.is_empty())
        .map(|item| capped(item, max_len))
        .take(max_items)
        .collect()
}

/// Per-language item lists, normalized and capped in both item length and
/// item count.
pub fn localized_list(
    input: &LocalizedListInput,
    max_items: usize,
    max_len: usize,
) -> LocalizedList {
    LocalizedList {
        ar: list_items(&input.ar, max_items, max_len),
        zgh: list_items(&input.zgh, max_items, max_len),
        en: list_items(&input.en, max_items, max_len),
    }
}

/// Accept only absolute http/https URLs; anything else becomes empty.
pub fn sanitize_url(value: &Value) -> String {
    let text = text_of(value);
    match url::Url::parse(&text) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => text,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_strips_angle_brackets_and_collapses_whitespace() {
        assert_eq!(
            normalize_text("  <script>hello</script>   world \n"),
            "scripthello/script world"
        );
    }

    #[test]
    fn normalize_strips_bidi_overrides_and_controls() {
        assert_eq!(normalize_text("a\u{202E}b\u{0007}c"), "abc");
        assert_eq!(normalize_text("a\tb\nc"), "a b c");
    }

    #[test]
    fn text_of_non_string_is_empty() {
        assert_eq!(text_of(&json!(42)), "");
        assert_eq!(text_of(&json!({"nested": true})), "");
        assert_eq!(text_of(&Value::Null), "");
    }

    #[test]
    fn localized_text_fills_missing_languages() {
        let input: LocalizedInput =
            serde_json::from_value(json!({"ar": "  سلام ", "bogus": "x"})).unwrap();
        let out = localized_text(&input, 100);
        assert_eq!(out.ar, "سلام");
        assert_eq!(out.zgh, "");
        assert_eq!(out.en, "");
    }

    #[test]
    fn localized_text_caps_length() {
        let input: LocalizedInput = serde_json::from_value(json!({"en": "abcdef"})).unwrap();
        assert_eq!(localized_text(&input, 3).en, "abc");
    }

    #[test]
    fn localized_list_splits_newline_blocks() {
        let input: LocalizedListInput =
            serde_json::from_value(json!({"ar": "a\nb\n\nc"})).unwrap();
        let out = localized_list(&input, 2, 50);
        assert_eq!(out.ar, vec!["a", "b"]);
        assert!(out.zgh.is_empty());
        assert!(out.en.is_empty());
    }

    #[test]
    fn localized_list_accepts_sequences_and_drops_non_strings() {
        let input: LocalizedListInput =
            serde_json::from_value(json!({"en": ["one", 2, " three "]})).unwrap();
        let out = localized_list(&input, 10, 50);
        assert_eq!(out.en, vec!["one", "three"]);
    }

    #[test]
    fn sanitize_url_accepts_http_and_https_only() {
        assert_eq!(
            sanitize_url(&json!("https://example.org/page")),
            "https://example.org/page"
        );
        assert_eq!(sanitize_url(&json!("javascript:alert(1)")), "");
        assert_eq!(sanitize_url(&json!("/relative/path")), "");
        assert_eq!(sanitize_url(&json!(17)), "");
    }
}
