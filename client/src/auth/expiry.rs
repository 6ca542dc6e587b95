use std::time::{SystemTime, UNIX_EPOCH};

use super::codec::decode_claims;

/// Current Unix timestamp in seconds.
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Local expiry check. Undecodable tokens count as expired.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, now_secs())
}

pub fn is_expired_at(token: &str, now: i64) -> bool {
    decode_claims(token)
        .map(|claims| claims.is_expired_at(now))
        .unwrap_or(true)
}
