//! Token wire format.
//!
//! ```text
//! token = base64url( [b64(iv) "|"] b64(payload) "|" decimal(timestamp) "|" b64(mac) )
//! ```
//!
//! The IV field is present iff the codec encrypts. Every field is non-empty.
//! Field encodings never contain `|` (see [`crate::encoding`]), and the
//! timestamp is decimal, so splitting on the delimiter is unambiguous.
//!
//! Parsing here is structural only. The caller verifies the MAC with
//! [`Envelope::verify`] before looking at the timestamp or payload.

use cookieseal_crypto::{Authenticator, mac_context};

use crate::{encoding, error::CodecError};

/// Field separator inside the decoded token
const DELIMITER: char = '|';

/// Decoded token fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Envelope {
    /// IV bytes, present for encrypted codecs
    pub(crate) iv: Option<Vec<u8>>,
    /// Ciphertext, or the serialized value when unencrypted
    pub(crate) payload: Vec<u8>,
    /// Seconds since the Unix epoch at encode time
    pub(crate) timestamp: i64,
    /// Tag over name, timestamp, IV and payload
    pub(crate) mac: Vec<u8>,
}

impl Envelope {
    /// Build an envelope and tag it for `name`.
    pub(crate) fn signed(
        name: &str,
        iv: Option<Vec<u8>>,
        payload: Vec<u8>,
        timestamp: i64,
        authenticator: &Authenticator,
    ) -> Self {
        let mut envelope = Self { iv, payload, timestamp, mac: Vec::new() };
        envelope.mac = authenticator.sign(&envelope.mac_context(name));
        envelope
    }

    /// Check the tag for `name`.
    ///
    /// # Errors
    ///
    /// - `Authentication`: If the tag does not match
    pub(crate) fn verify(
        &self,
        name: &str,
        authenticator: &Authenticator,
    ) -> Result<(), CodecError> {
        authenticator
            .verify(&self.mac_context(name), &self.mac)
            .map_err(|_| CodecError::Authentication)
    }

    fn mac_context(&self, name: &str) -> Vec<u8> {
        let timestamp = self.timestamp.to_be_bytes();
        let payload = self.payload.as_slice();
        match &self.iv {
            Some(iv) => mac_context(name, &[&timestamp[..], iv.as_slice(), payload]),
            None => mac_context(name, &[&timestamp[..], payload]),
        }
    }

    /// Render the token string.
    ///
    /// # Errors
    ///
    /// - `Encoding`: If the payload, IV or tag is empty, or the timestamp is
    ///   before the epoch
    pub(crate) fn to_token(&self) -> Result<String, CodecError> {
        if self.timestamp < 0 {
            return Err(CodecError::Encoding { reason: "timestamp before epoch" });
        }
        if self.payload.is_empty() {
            return Err(CodecError::Encoding { reason: "payload is empty" });
        }
        if self.mac.is_empty() {
            return Err(CodecError::Encoding { reason: "tag is empty" });
        }

        let mut joined = String::new();
        if let Some(iv) = &self.iv {
            if iv.is_empty() {
                return Err(CodecError::Encoding { reason: "IV is empty" });
            }
            joined.push_str(&encoding::encode(iv));
            joined.push(DELIMITER);
        }
        joined.push_str(&encoding::encode(&self.payload));
        joined.push(DELIMITER);
        joined.push_str(&self.timestamp.to_string());
        joined.push(DELIMITER);
        joined.push_str(&encoding::encode(&self.mac));

        Ok(encoding::encode(joined.as_bytes()))
    }

    /// Parse a token string.
    ///
    /// `encrypted` selects the four-field layout with a leading IV.
    ///
    /// # Errors
    ///
    /// - `Decoding`: If the token or any field is not valid base64, the field
    ///   count is wrong, a field is empty, or the timestamp is not canonical
    pub(crate) fn parse(token: &str, encrypted: bool) -> Result<Self, CodecError> {
        let joined = encoding::decode(token)?;
        let joined = std::str::from_utf8(&joined)
            .map_err(|_| CodecError::Decoding { reason: "token is not UTF-8" })?;

        let fields: Vec<&str> = joined.split(DELIMITER).collect();
        let expected = if encrypted { 4 } else { 3 };
        if fields.len() != expected {
            return Err(CodecError::Decoding { reason: "wrong field count" });
        }
        if fields.iter().any(|field| field.is_empty()) {
            return Err(CodecError::Decoding { reason: "empty field" });
        }

        let (iv, rest) = if encrypted {
            (Some(encoding::decode(fields[0])?), &fields[1..])
        } else {
            (None, &fields[..])
        };

        let payload = encoding::decode(rest[0])?;
        let timestamp = parse_timestamp(rest[1])?;
        let mac = encoding::decode(rest[2])?;

        Ok(Self { iv, payload, timestamp, mac })
    }
}

/// Parse a non-negative decimal timestamp, accepting only the form
/// `i64::to_string` produces.
fn parse_timestamp(field: &str) -> Result<i64, CodecError> {
    let invalid = || CodecError::Decoding { reason: "invalid timestamp" };

    let timestamp: i64 = field.parse().map_err(|_| invalid())?;
    if timestamp < 0 || timestamp.to_string() != field {
        return Err(invalid());
    }
    Ok(timestamp)
}
