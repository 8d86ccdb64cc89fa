//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! backend. All types derive Serde traits for deserialization from config
//! files, and every section has defaults so a minimal config works.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the content backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Content store location and seed input.
    pub store: StoreConfig,

    /// Origin policy and admin credentials.
    pub security: SecurityConfig,

    /// Per-tier rate limits.
    pub rate_limits: RateLimitsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Hard ceiling on request body size in bytes.
    pub max_body_bytes: usize,

    /// Maximum accepted request URI length in bytes.
    pub max_uri_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 64 * 1024,
            max_uri_bytes: 2048,
            request_timeout_secs: 30,
        }
    }
}

/// Content store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON snapshot document.
    pub path: PathBuf,

    /// Optional seed document with static localized content.
    pub seed_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/content.json"),
            seed_path: None,
        }
    }
}

/// Minimum admin token length accepted in production mode.
pub const MIN_ADMIN_TOKEN_LEN: usize = 32;

/// Origin policy and admin access configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Origins allowed to hit mutation routes (scheme://host[:port]).
    pub allowed_origins: Vec<String>,

    /// Accept mutating requests that carry neither Origin nor Referer.
    /// Off by default; enable only for trusted non-browser clients.
    pub allow_no_origin: bool,

    /// Bearer token for admin routes.
    pub admin_token: String,

    /// Production-like mode: admin routes refuse to serve without a
    /// sufficiently long token.
    pub production: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_no_origin: false,
            admin_token: String::new(),
            production: false,
        }
    }
}

/// One fixed-window rate tier.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TierConfig {
    /// Maximum requests per window per client key.
    pub limit: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            window_secs: 60,
        }
    }
}

/// Rate limiting configuration, one independent store per tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitsConfig {
    /// Cap on tracked client keys per tier (memory bound).
    pub max_tracked_keys: usize,

    /// Generic per-IP API tier.
    pub api: TierConfig,

    /// Contact form submissions.
    pub contact: TierConfig,

    /// Newsletter signups.
    pub newsletter: TierConfig,

    /// Admin routes.
    pub admin: TierConfig,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            max_tracked_keys: 10_000,
            api: TierConfig {
                limit: 100,
                window_secs: 60,
            },
            contact: TierConfig {
                limit: 5,
                window_secs: 600,
            },
            newsletter: TierConfig {
                limit: 5,
                window_secs: 600,
            },
            admin: TierConfig {
                limit: 30,
                window_secs: 60,
            },
        }
    }
}
