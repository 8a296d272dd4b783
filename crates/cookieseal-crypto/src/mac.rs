//! HMAC authentication for token envelopes
//!
//! # Security Properties
//!
//! - Context binding: the tag covers the token name and every envelope field
//! - Unambiguous framing: each context field carries a length prefix
//! - Constant-time verification: mismatch position does not affect timing

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::{error::CryptoError, keys::SecretKey};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Keyed hash used for token tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacAlgorithm {
    /// HMAC-SHA256, 32-byte tags
    #[default]
    HmacSha256,
    /// HMAC-SHA512, 64-byte tags
    HmacSha512,
}

/// Build the MAC input for a token.
///
/// Layout: `len(name) || name || len(f0) || f0 || len(f1) || f1 ...` with
/// every length as a big-endian `u64`.
pub fn mac_context(name: &str, fields: &[&[u8]]) -> Vec<u8> {
    let capacity = 8 + name.len() + fields.iter().map(|f| 8 + f.len()).sum::<usize>();
    let mut context = Vec::with_capacity(capacity);

    context.extend_from_slice(&(name.len() as u64).to_be_bytes());
    context.extend_from_slice(name.as_bytes());
    for field in fields {
        context.extend_from_slice(&(field.len() as u64).to_be_bytes());
        context.extend_from_slice(field);
    }

    context
}

/// Computes and verifies tags under one hash key.
#[derive(Debug, Clone)]
pub struct Authenticator {
    key: SecretKey,
    algorithm: MacAlgorithm,
}

impl Authenticator {
    /// Create an authenticator for `key`.
    pub fn new(key: SecretKey, algorithm: MacAlgorithm) -> Self {
        Self { key, algorithm }
    }

    /// Same key, different algorithm.
    pub fn with_algorithm(self, algorithm: MacAlgorithm) -> Self {
        Self { algorithm, ..self }
    }

    /// Compute the tag over `context`.
    pub fn sign(&self, context: &[u8]) -> Vec<u8> {
        match self.algorithm {
            MacAlgorithm::HmacSha256 => {
                let Ok(mut mac) = HmacSha256::new_from_slice(self.key.as_bytes()) else {
                    unreachable!("HMAC-SHA256 accepts any key size");
                };
                mac.update(context);
                mac.finalize().into_bytes().to_vec()
            },
            MacAlgorithm::HmacSha512 => {
                let Ok(mut mac) = HmacSha512::new_from_slice(self.key.as_bytes()) else {
                    unreachable!("HMAC-SHA512 accepts any key size");
                };
                mac.update(context);
                mac.finalize().into_bytes().to_vec()
            },
        }
    }

    /// Check `tag` against the tag recomputed over `context`.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed`: If the tags differ in any byte or in length
    pub fn verify(&self, context: &[u8], tag: &[u8]) -> Result<(), CryptoError> {
        let expected = self.sign(context);

        // Length is public (fixed per algorithm); content comparison is
        // constant-time.
        if bool::from(expected.as_slice().ct_eq(tag)) {
            Ok(())
        } else {
            Err(CryptoError::AuthenticationFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(key: &[u8]) -> Authenticator {
        Authenticator::new(SecretKey::new(key.to_vec()).unwrap(), MacAlgorithm::HmacSha256)
    }

    #[test]
    fn sign_verify_roundtrip() {
        let auth = authenticator(b"secret-key");

        for value in ["foo", "bar", "baz"] {
            let tag = auth.sign(value.as_bytes());
            auth.verify(value.as_bytes(), &tag).unwrap();
        }
    }

    #[test]
    fn matches_rfc4231_case_2() {
        // RFC 4231, test case 2
        let auth = authenticator(b"Jefe");
        let tag = auth.sign(b"what do ya want for nothing?");

        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn tag_lengths_match_algorithm() {
        let key = SecretKey::new(b"k".to_vec()).unwrap();

        for (algorithm, len) in [(MacAlgorithm::HmacSha256, 32), (MacAlgorithm::HmacSha512, 64)] {
            let auth = Authenticator::new(key.clone(), algorithm);
            assert_eq!(auth.sign(b"context").len(), len);
        }
    }

    #[test]
    fn wrong_key_fails_verification() {
        let tag = authenticator(b"12345").sign(b"payload");
        let result = authenticator(b"54321").verify(b"payload", &tag);

        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampered_tag_fails_verification() {
        let auth = authenticator(b"secret-key");
        let mut tag = auth.sign(b"payload");
        let last = tag.len() - 1;
        tag[last] ^= 0x01;

        assert!(auth.verify(b"payload", &tag).is_err());
    }

    #[test]
    fn truncated_tag_fails_verification() {
        let auth = authenticator(b"secret-key");
        let tag = auth.sign(b"payload");

        assert!(auth.verify(b"payload", &tag[..16]).is_err());
        assert!(auth.verify(b"payload", &[]).is_err());
    }

    #[test]
    fn context_prefixes_name_length() {
        let context = mac_context("sid", &[b"ab".as_slice()]);

        assert_eq!(&context[0..8], &3u64.to_be_bytes());
        assert_eq!(&context[8..11], b"sid");
        assert_eq!(&context[11..19], &2u64.to_be_bytes());
        assert_eq!(&context[19..], b"ab");
    }

    #[test]
    fn context_is_unambiguous_across_field_splits() {
        // Same concatenated bytes, different boundaries
        let a = mac_context("ab", &[b"c".as_slice()]);
        let b = mac_context("a", &[b"bc".as_slice()]);
        let c = mac_context("abc", &[]);

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }
}
