//! Fixed-window rate limiting with tiered stores.
//!
//! Each tier (generic API, contact, newsletter, admin) owns an
//! independent keyspace, limit and window, so exhausting one tier never
//! affects another. Windows are fixed, not sliding: bursts of up to
//! `2 × limit` are possible across a window boundary, accepted in
//! exchange for O(1) memory and CPU per check.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Response},
    middleware::Next,
    response::IntoResponse,
};

use crate::config::{RateLimitsConfig, TierConfig};
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Outcome of one rate check, attached to every gated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateVerdict {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_secs: u64,
}

struct RateWindow {
    count: u32,
    reset_at: Instant,
}

/// Per-key fixed-window counters with a hard cap on tracked keys.
pub struct FixedWindowLimiter {
    entries: Mutex<HashMap<String, RateWindow>>,
    limit: u32,
    window: Duration,
    max_keys: usize,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: Duration, max_keys: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            limit,
            window,
            max_keys,
        }
    }

    pub fn from_tier(tier: TierConfig, max_keys: usize) -> Self {
        Self::new(tier.limit, Duration::from_secs(tier.window_secs), max_keys)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request for `key` and report the verdict.
    pub fn check(&self, key: &str) -> RateVerdict {
        self.check_at(key, Instant::now())
    }

    // Check-and-increment is a single uninterrupted operation under the
    // store lock; callers never observe a torn counter.
    fn check_at(&self, key: &str, now: Instant) -> RateVerdict {
        let mut entries = self.entries.lock().expect("rate limiter mutex poisoned");

        let entry = entries.entry(key.to_string()).or_insert_with(|| RateWindow {
            count: 0,
            reset_at: now + self.window,
        });
        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window;
        }
        entry.count += 1;

        let verdict = RateVerdict {
            allowed: entry.count <= self.limit,
            limit: self.limit,
            remaining: self.limit.saturating_sub(entry.count),
            reset_secs: ceil_secs(entry.reset_at.saturating_duration_since(now)),
        };

        self.enforce_cap(&mut entries, now);
        verdict
    }

    /// Memory bound: purge expired entries first, then evict arbitrary
    /// ones until at or under the cap. A client evicted mid-window may be
    /// under-limited; unbounded growth is the worse failure mode.
    fn enforce_cap(&self, entries: &mut HashMap<String, RateWindow>, now: Instant) {
        if entries.len() <= self.max_keys {
            return;
        }
        entries.retain(|_, window| now < window.reset_at);
        while entries.len() > self.max_keys {
            let victim = match entries.keys().next() {
                Some(key) => key.clone(),
                None => break,
            };
            entries.remove(&victim);
        }
    }

    /// Drop windows that have already reset.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("rate limiter mutex poisoned");
        entries.retain(|_, window| now < window.reset_at);
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries
            .lock()
            .expect("rate limiter mutex poisoned")
            .len()
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// All tiers, one store each.
pub struct RateLimiters {
    pub api: FixedWindowLimiter,
    pub contact: FixedWindowLimiter,
    pub newsletter: FixedWindowLimiter,
    pub admin: FixedWindowLimiter,
}

impl RateLimiters {
    pub fn from_config(config: &RateLimitsConfig) -> Self {
        let cap = config.max_tracked_keys;
        Self {
            api: FixedWindowLimiter::from_tier(config.api, cap),
            contact: FixedWindowLimiter::from_tier(config.contact, cap),
            newsletter: FixedWindowLimiter::from_tier(config.newsletter, cap),
            admin: FixedWindowLimiter::from_tier(config.admin, cap),
        }
    }

    /// Spawn one background sweep task per tier, ticking at the tier's
    /// window length. Sweeps never block request handling.
    pub fn spawn_sweepers(self: &Arc<Self>) {
        for pick in [
            Self::pick_api,
            Self::pick_contact,
            Self::pick_newsletter,
            Self::pick_admin,
        ] {
            let limiters = Arc::clone(self);
            tokio::spawn(async move {
                let period = pick(&limiters).window();
                let mut tick = tokio::time::interval(period);
                tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    tick.tick().await;
                    pick(&limiters).sweep();
                }
            });
        }
    }

    fn pick_api(&self) -> &FixedWindowLimiter {
        &self.api
    }
    fn pick_contact(&self) -> &FixedWindowLimiter {
        &self.contact
    }
    fn pick_newsletter(&self) -> &FixedWindowLimiter {
        &self.newsletter
    }
    fn pick_admin(&self) -> &FixedWindowLimiter {
        &self.admin
    }
}

/// Client key for rate limiting: the peer IP when known.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Attach the rate metadata headers carried by every gated response.
pub fn attach_rate_headers(response: &mut Response<Body>, verdict: &RateVerdict) {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(verdict.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(verdict.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(verdict.reset_secs));
}

fn run_tier(
    limiter: &FixedWindowLimiter,
    tier: &'static str,
    request: &Request,
) -> Result<RateVerdict, (RateVerdict, Response<Body>)> {
    let key = client_key(request);
    let verdict = limiter.check(&key);
    if verdict.allowed {
        Ok(verdict)
    } else {
        tracing::warn!(client = %key, tier, "Rate limit exceeded");
        Err((verdict, ApiError::RateLimited(verdict).into_response()))
    }
}

macro_rules! tier_middleware {
    ($name:ident, $field:ident, $tier:literal) => {
        pub async fn $name(
            State(state): State<AppState>,
            request: Request,
            next: Next,
        ) -> Response<Body> {
            match run_tier(&state.limiters.$field, $tier, &request) {
                Ok(verdict) => {
                    let mut response = next.run(request).await;
                    attach_rate_headers(&mut response, &verdict);
                    response
                }
                Err((verdict, mut response)) => {
                    attach_rate_headers(&mut response, &verdict);
                    response
                }
            }
        }
    };
}

tier_middleware!(api_rate_limit, api, "api");
tier_middleware!(contact_rate_limit, contact, "contact");
tier_middleware!(newsletter_rate_limit, newsletter, "newsletter");
tier_middleware!(admin_rate_limit, admin, "admin");
