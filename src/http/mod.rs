//! HTTP surface: server wiring and response/error mapping.

pub mod response;
pub mod server;

pub use response::ApiError;
pub use server::{AppState, HttpServer, build_router};
