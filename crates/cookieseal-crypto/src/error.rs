//! Error types for cryptographic operations

use thiserror::Error;

/// Errors from MAC, cipher and key operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Key material was empty
    #[error("key must not be empty")]
    EmptyKey,

    /// Block key length does not select an AES variant
    #[error("invalid key length: expected one of {expected:?}, got {actual}")]
    InvalidKeyLength {
        /// Accepted key lengths
        expected: &'static [usize],
        /// Actual key length
        actual: usize,
    },

    /// Tag did not match the recomputed MAC
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Ciphertext was malformed
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// Reason for decryption failure
        reason: &'static str,
    },

    /// The OS random number generator failed
    #[error("entropy source failed: {reason}")]
    Entropy {
        /// Error reported by the OS RNG
        reason: String,
    },
}
