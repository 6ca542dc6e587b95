use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use shared::types::TokenClaims;

/// base64url that tolerates both padded and unpadded segments.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode the payload segment of `header.payload.signature` without
/// checking the signature.
///
/// Returns `None` for anything that is not exactly three segments, not
/// base64url, not UTF-8, or not a JSON object. Callers treat `None` the
/// same as having no token at all.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return None;
    };

    let bytes = PAYLOAD_ENGINE.decode(payload.trim()).ok()?;
    let json = std::str::from_utf8(&bytes).ok()?;
    serde_json::from_str(json).ok()
}
