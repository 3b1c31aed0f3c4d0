//! Bearer token inspection.
//!
//! Tokens are opaque to this crate. The only thing ever read from them is
//! the unverified `exp` claim of a JWT-shaped token, used to decide when the
//! client should stop trusting a stored token. No signature is checked.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Response header carrying a freshly issued token.
pub const BEARER_HEADER: &str = "Bearer";

/// Authorization scheme used when sending the token back.
pub const BEARER_SCHEME: &str = "Bearer";

/// Formats the `Authorization` header value for a token.
#[must_use]
pub fn authorization_value(token: &str) -> String {
    format!("{BEARER_SCHEME} {token}")
}

/// Reads the `exp` claim (seconds since the epoch) from a JWT-shaped token.
///
/// Returns `None` when the token does not have exactly three dot-separated
/// segments, the middle segment is not base64url, the payload is not a JSON
/// object, or `exp` is missing or out of range.
#[must_use]
pub fn token_expiration(token: &str) -> Option<DateTime<Utc>> {
    let claims = decode_payload(token)?;
    let seconds = match claims.get("exp")? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(float_seconds))?,
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0)
}

/// Returns true if a token with the given expiration must be treated as expired.
///
/// An unknown expiration counts as expired.
#[must_use]
pub fn is_expired_at(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_none_or(|expires_at| expires_at <= now)
}

fn decode_payload(token: &str) -> Option<serde_json::Map<String, Value>> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return None;
    };

    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_seconds(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up, so the upper bound is exclusive.
    (value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64)
        .then(|| value.trunc() as i64)
}
