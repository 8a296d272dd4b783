//! Transport-safe byte encoding.
//!
//! URL-safe base64 without padding. The alphabet (`A-Z a-z 0-9 - _`)
//! excludes the envelope delimiter `|`, cookie separators and whitespace, so
//! an encoded field can never be confused with field structure.
//!
//! Decoding is strict: padding, characters outside the alphabet and
//! non-canonical trailing bits are all rejected, so each token string has
//! exactly one byte interpretation.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::error::CodecError;

/// Encode bytes as unpadded URL-safe base64.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded URL-safe base64.
///
/// # Errors
///
/// - `Decoding`: If `encoded` is empty, not valid base64 in this alphabet, or
///   decodes to zero bytes
pub fn decode(encoded: &str) -> Result<Vec<u8>, CodecError> {
    if encoded.is_empty() {
        return Err(CodecError::Decoding { reason: "empty input" });
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| CodecError::Decoding { reason: "invalid base64" })?;

    if bytes.is_empty() {
        return Err(CodecError::Decoding { reason: "empty input" });
    }

    Ok(bytes)
}
