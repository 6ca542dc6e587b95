use shared::types::RoleClass;

use super::codec::decode_claims;

/// Trimmed role claim of `token`.
pub fn role_of(token: &str) -> Option<String> {
    decode_claims(token)?.role_claim().map(str::to_string)
}

/// Whether `token` was issued for `expected`. Comparison is exact after
/// trimming; case is not normalized.
pub fn validate_role(token: &str, expected: RoleClass) -> bool {
    role_of(token).is_some_and(|role| role == expected.claim())
}
