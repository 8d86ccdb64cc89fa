//! Timing and honeypot heuristics for public form submissions.
//!
//! The frontend renders decoy fields hidden from humans and stamps the
//! form with the time it was opened. Naive automation fills the decoys or
//! submits instantly; both signals are cheap to check server-side.

use serde::Deserialize;

/// A human needs at least this long to fill a form.
pub const MIN_FILL_MS: i64 = 3_000;

/// Submissions from forms opened longer ago than this are stale.
pub const MAX_FORM_AGE_MS: i64 = 60 * 60 * 1000;

/// Allowed client clock skew into the future.
pub const FUTURE_TOLERANCE_MS: i64 = 5_000;

/// Anti-bot fields common to every public form payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BotCheckFields {
    /// Honeypot: hidden "website" input, must stay empty.
    pub website: String,
    /// Honeypot: hidden "fax" input, must stay empty.
    pub fax: String,
    /// Client-supplied unix millis of when the form was opened.
    pub form_started_at: Option<i64>,
}

/// Heuristic verdict: `true` when the submission looks automated.
pub fn is_automated(fields: &BotCheckFields, now_ms: i64) -> bool {
    if !fields.website.trim().is_empty() || !fields.fax.trim().is_empty() {
        return true;
    }
    let started = match fields.form_started_at {
        Some(ts) if ts > 0 => ts,
        _ => return true,
    };
    if started > now_ms + FUTURE_TOLERANCE_MS {
        return true;
    }
    let elapsed = now_ms - started;
    elapsed < MIN_FILL_MS || elapsed > MAX_FORM_AGE_MS
}
