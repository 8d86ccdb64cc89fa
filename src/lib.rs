//! Content backend for the Amal association website.
//!
//! Two subsystems carry the weight: a persistent single-writer content
//! store (settings, projects, news and media in one JSON snapshot with
//! serialized updates) and a request gate in front of every mutation
//! route (shape limits, tiered fixed-window rate limiting, payload
//! defense, origin policy, admin auth). Everything else is thin wiring
//! around them.

pub mod admin;
pub mod config;
pub mod http;
pub mod routes;
pub mod sanitize;
pub mod security;
pub mod store;

pub use config::AppConfig;
pub use http::{ApiError, AppState, HttpServer};
pub use store::{ContentStore, Seed, StoreError};
