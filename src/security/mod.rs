//! Request gating: shape limits, rate limiting, payload defense and
//! origin policy. Composed in front of every route in `http::server`,
//! short-circuiting on the first rejection.

pub mod limits;
pub mod origin;
pub mod payload;
pub mod rate_limit;

pub use rate_limit::{FixedWindowLimiter, RateLimiters, RateVerdict};
