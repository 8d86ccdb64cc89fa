//! Pure, stateless sanitization of untrusted input: text normalization,
//! localized projections, slugs, URLs and bot heuristics.

pub mod bot;
pub mod slug;
pub mod text;

pub use bot::{BotCheckFields, is_automated};
pub use slug::{resolve_unique_slug, slugify};
pub use text::{
    LocalizedInput, LocalizedListInput, localized_list, localized_text, normalize_text,
    sanitize_url, text_of, text_of_capped,
};
