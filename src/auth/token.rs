//! Client-side inspection of access tokens
//!
//! The expiry read here comes from an unverified token body. It only decides
//! when to attempt renewal and must never be used to authorize anything.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<f64>,
}

/// Expiry of a JWT-shaped token in epoch seconds
///
/// Returns `None` when the token has no payload segment, the payload is not
/// base64 JSON, or it carries no numeric `exp`.
pub fn expires_at(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    claims.exp.map(|exp| exp as i64)
}

/// Whether the token must be renewed before use at `now` (epoch seconds)
///
/// A token whose expiry cannot be read counts as expired.
pub fn needs_renewal(token: &str, now: i64) -> bool {
    match expires_at(token) {
        Some(exp) => now >= exp,
        None => true,
    }
}

/// Current time in epoch seconds
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
