//! Key material and OS randomness
//!
//! Keys are supplied by the caller. This module only wraps them so they are
//! wiped on drop and never printed, plus a helper for minting fresh keys.

use std::fmt;

use zeroize::Zeroize;

use crate::error::CryptoError;

/// Opaque key bytes.
///
/// Zeroized when dropped. `Debug` prints only the length.
#[derive(Clone)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl SecretKey {
    /// Wrap caller-provided key bytes.
    ///
    /// # Errors
    ///
    /// - `EmptyKey`: If `bytes` is empty
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, CryptoError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(CryptoError::EmptyKey);
        }
        Ok(Self { bytes })
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty keys are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey").field("len", &self.bytes.len()).finish_non_exhaustive()
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Fill `buffer` from the OS CSPRNG.
///
/// # Errors
///
/// - `Entropy`: If the OS RNG is unavailable. Callers must abort the
///   operation; there is no fallback source.
pub fn fill_random(buffer: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::fill(buffer).map_err(|e| {
        tracing::error!(error = %e, "OS RNG failure");
        CryptoError::Entropy { reason: e.to_string() }
    })
}

/// Generate a random key of `len` bytes.
///
/// Use 32 or 64 bytes for hash keys and 16, 24 or 32 bytes for block keys.
/// The key is returned to the caller and not retained.
pub fn generate_random_key(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut key = vec![0u8; len];
    fill_random(&mut key)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(SecretKey::new(Vec::new()), Err(CryptoError::EmptyKey)));
    }

    #[test]
    fn debug_does_not_leak_key_bytes() {
        let key = SecretKey::new(b"super-secret-hash-key".to_vec()).unwrap();
        let printed = format!("{key:?}");

        assert!(printed.contains("len: 21"));
        assert!(!printed.contains("super"));
        assert!(!printed.contains("115")); // b's'
    }

    #[test]
    fn generated_keys_have_requested_length() {
        for len in [16, 24, 32, 64] {
            assert_eq!(generate_random_key(len).unwrap().len(), len);
        }
    }

    #[test]
    fn generated_keys_differ() {
        let a = generate_random_key(32).unwrap();
        let b = generate_random_key(32).unwrap();

        // Extremely unlikely to be equal if random
        assert_ne!(a, b);
    }

    #[test]
    fn zero_length_key_generation_is_empty() {
        assert!(generate_random_key(0).unwrap().is_empty());
    }
}
