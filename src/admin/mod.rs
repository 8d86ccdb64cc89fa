//! Admin surface: token auth plus create/update/delete handlers for every
//! entity kind.

pub mod auth;
pub mod handlers;
