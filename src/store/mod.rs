//! Persistent content store: document model, seed reconciliation and the
//! single-writer store itself.

pub mod document;
pub mod seed;
#[allow(clippy::module_inception)]
pub mod store;

pub use document::{
    ContentDocument, Impact, Localized, LocalizedList, MediaItem, MediaKind, NewsItem, NextIds,
    Project, Settings, Slugged,
};
pub use seed::Seed;
pub use store::{ContentStore, StoreError};
