//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones. Returns all
//! validation errors, not just the first, so one restart fixes them all.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{AppConfig, MIN_ADMIN_TOKEN_LEN, TierConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(errors: &mut Vec<ValidationError>, field: &str, message: impl Into<String>) {
    errors.push(ValidationError {
        field: field.to_string(),
        message: message.into(),
    });
}

fn check_tier(errors: &mut Vec<ValidationError>, name: &str, tier: &TierConfig) {
    if tier.limit == 0 {
        err(errors, name, "limit must be greater than zero");
    }
    if tier.window_secs == 0 {
        err(errors, name, "window_secs must be greater than zero");
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        err(
            &mut errors,
            "server.bind_address",
            format!("not a valid socket address: {}", config.server.bind_address),
        );
    }
    if config.server.max_body_bytes == 0 {
        err(&mut errors, "server.max_body_bytes", "must be greater than zero");
    }
    if config.server.max_uri_bytes == 0 {
        err(&mut errors, "server.max_uri_bytes", "must be greater than zero");
    }

    for origin in &config.security.allowed_origins {
        match url::Url::parse(origin) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            _ => err(
                &mut errors,
                "security.allowed_origins",
                format!("not an absolute http(s) origin: {origin}"),
            ),
        }
    }
    if config.security.production
        && !config.security.admin_token.is_empty()
        && config.security.admin_token.len() < MIN_ADMIN_TOKEN_LEN
    {
        err(
            &mut errors,
            "security.admin_token",
            format!("shorter than {MIN_ADMIN_TOKEN_LEN} bytes; admin routes will refuse to serve"),
        );
    }

    if config.rate_limits.max_tracked_keys == 0 {
        err(
            &mut errors,
            "rate_limits.max_tracked_keys",
            "must be greater than zero",
        );
    }
    check_tier(&mut errors, "rate_limits.api", &config.rate_limits.api);
    check_tier(&mut errors, "rate_limits.contact", &config.rate_limits.contact);
    check_tier(
        &mut errors,
        "rate_limits.newsletter",
        &config.rate_limits.newsletter,
    );
    check_tier(&mut errors, "rate_limits.admin", &config.rate_limits.admin);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
