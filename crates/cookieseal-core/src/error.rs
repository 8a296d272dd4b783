//! Error types for token encoding and decoding.
//!
//! Every failure is tagged with the pipeline stage that produced it (see
//! [`CodecError::kind`]). The `Display` text is deliberately coarser: token
//! rejections caused by malformed structure, a bad MAC or bad ciphertext all
//! print the same message, so an adversary probing tokens cannot tell which
//! check failed. Messages never contain key material, payload bytes or tags.

use cookieseal_crypto::CryptoError;
use thiserror::Error;

use crate::serializer::SerializeError;

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Codec misconfigured (missing hash key, bad block key)
    Usage,
    /// Value could not be serialized, or payload could not be deserialized
    Serialization,
    /// Serializer does not support the value or destination type
    Type,
    /// A token could not be built from the encoded fields
    Encoding,
    /// Token structure is malformed
    Decoding,
    /// MAC verification failed
    Authentication,
    /// Ciphertext is malformed
    Decryption,
    /// Token is older than the maximum age
    Expired,
    /// Token is younger than the minimum age or timestamped in the future
    TooNew,
    /// Token exceeds the maximum length
    TooLong,
    /// Multi-codec operation given no codecs
    NoCodecs,
    /// Entropy source failed
    Internal,
    /// Every codec in a multi-codec decode failed
    Multi,
}

/// Errors from codec construction, encode and decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Hash key is empty
    #[error("hash key is not set")]
    HashKeyNotSet,

    /// Block key cannot key the cipher
    #[error("invalid block key: {0}")]
    InvalidBlockKey(CryptoError),

    /// Serializer failed
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Serializer does not accept this type
    #[error("unsupported value type: expected {expected}")]
    Type {
        /// What the serializer accepts
        expected: &'static str,
    },

    /// Token could not be assembled
    #[error("the value could not be encoded: {reason}")]
    Encoding {
        /// Which field was rejected
        reason: &'static str,
    },

    /// Token structure is malformed
    #[error("the token is not valid")]
    Decoding {
        /// Internal detail, kept out of `Display`
        reason: &'static str,
    },

    /// MAC mismatch
    #[error("the token is not valid")]
    Authentication,

    /// Ciphertext malformed
    #[error("the token is not valid")]
    Decryption {
        /// Internal detail, kept out of `Display`
        reason: &'static str,
    },

    /// Token older than `max_age`
    #[error("the token has expired")]
    Expired {
        /// Token age in seconds
        age: i64,
        /// Configured maximum age in seconds
        max_age: u64,
    },

    /// Token younger than `min_age` or ahead of the clock
    #[error("the token timestamp is too new")]
    TooNew {
        /// Token age in seconds (negative when in the future)
        age: i64,
    },

    /// Token longer than `max_length`
    #[error("the token is too long: {length} bytes, limit {max_length}")]
    TooLong {
        /// Token length in bytes
        length: usize,
        /// Configured limit in bytes
        max_length: usize,
    },

    /// No codecs were configured
    #[error("no codecs provided")]
    NoCodecs,

    /// Entropy source failed
    #[error("internal error: {0}")]
    Internal(CryptoError),

    /// Every codec failed; errors are in codec order
    #[error("{}", display_multi(.0))]
    Multi(Vec<CodecError>),
}

fn display_multi(errors: &[CodecError]) -> String {
    match errors {
        [] => "no codec accepted the token".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} other errors)", rest.len()),
    }
}

impl CodecError {
    /// Stage that produced this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::HashKeyNotSet | Self::InvalidBlockKey(_) => ErrorKind::Usage,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Type { .. } => ErrorKind::Type,
            Self::Encoding { .. } => ErrorKind::Encoding,
            Self::Decoding { .. } => ErrorKind::Decoding,
            Self::Authentication => ErrorKind::Authentication,
            Self::Decryption { .. } => ErrorKind::Decryption,
            Self::Expired { .. } => ErrorKind::Expired,
            Self::TooNew { .. } => ErrorKind::TooNew,
            Self::TooLong { .. } => ErrorKind::TooLong,
            Self::NoCodecs => ErrorKind::NoCodecs,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Multi(_) => ErrorKind::Multi,
        }
    }

    /// Returns true if the caller misused the API.
    ///
    /// Usage errors are deterministic: retrying with the same configuration
    /// or value type fails the same way.
    pub fn is_usage(&self) -> bool {
        match self {
            Self::HashKeyNotSet | Self::InvalidBlockKey(_) | Self::Type { .. } | Self::NoCodecs => {
                true
            },
            Self::Multi(errors) => errors.iter().all(Self::is_usage),
            _ => false,
        }
    }

    /// Returns true if a token was rejected.
    ///
    /// Decode errors are the expected outcome for stale, forged or corrupted
    /// input. Callers typically treat them as "no valid token".
    pub fn is_decode(&self) -> bool {
        match self {
            Self::Decoding { .. }
            | Self::Authentication
            | Self::Decryption { .. }
            | Self::Expired { .. }
            | Self::TooNew { .. }
            | Self::TooLong { .. } => true,
            Self::Multi(errors) => errors.iter().any(Self::is_decode),
            _ => false,
        }
    }

    /// Returns true if the failure is internal to this process.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Serialization(_) | Self::Encoding { .. } | Self::Internal(_) => true,
            Self::Multi(errors) => errors.iter().any(Self::is_internal),
            _ => false,
        }
    }
}

impl From<SerializeError> for CodecError {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::Type { expected } => Self::Type { expected },
            SerializeError::Format(reason) => Self::Serialization(reason),
        }
    }
}
