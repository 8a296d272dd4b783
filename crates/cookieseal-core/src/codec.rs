//! Single-key token codec.
//!
//! # Encode
//!
//! ```text
//! value ─► serialize ─► [encrypt(block key, fresh IV)] ─► MAC(hash key) ─► token
//! ```
//!
//! # Decode
//!
//! ```text
//! token ─► length ─► parse ─► verify MAC ─► age window ─► [decrypt] ─► deserialize
//! ```
//!
//! Nothing past the MAC check runs on unauthenticated bytes: the timestamp,
//! IV and ciphertext are only interpreted once the tag has been verified.
//!
//! # Security
//!
//! - Encrypt-then-MAC: the tag covers the IV and ciphertext
//! - The tag binds the token name, so a token minted for one name is rejected
//!   under any other
//! - CTR mode without the MAC is malleable; the MAC is always on, a codec
//!   cannot be built without a hash key

use std::time::Duration;

use cookieseal_crypto::{
    Authenticator, BLOCK_SIZE, BlockCipher, CryptoError, EncryptedPayload, MacAlgorithm,
    SecretKey,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config::CodecConfig,
    env::{Environment, SystemEnv},
    envelope::Envelope,
    error::CodecError,
    serializer::{CborSerializer, Serializer},
};

/// Encodes values into authenticated, optionally encrypted tokens and back.
///
/// A codec is immutable once built and safe to share across threads; every
/// `encode` draws its own IV and reads the clock independently.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use cookieseal_core::Codec;
///
/// let codec = Codec::new(b"hash-key", Some(b"0123456789abcdef".as_slice())).unwrap();
///
/// let value = HashMap::from([("foo".to_string(), "bar".to_string())]);
/// let token = codec.encode("session", &value).unwrap();
///
/// let decoded: HashMap<String, String> = codec.decode("session", &token).unwrap();
/// assert_eq!(decoded, value);
/// ```
#[derive(Debug, Clone)]
pub struct Codec<S = CborSerializer, E = SystemEnv> {
    authenticator: Authenticator,
    cipher: Option<BlockCipher>,
    config: CodecConfig,
    serializer: S,
    env: E,
}

impl Codec {
    /// Create a codec with default settings.
    ///
    /// `hash_key` authenticates tokens and is required. `block_key` enables
    /// AES-CTR encryption; its length (16, 24 or 32 bytes) selects
    /// AES-128/192/256. Without a block key tokens are authenticated but
    /// readable by anyone.
    ///
    /// # Errors
    ///
    /// - `HashKeyNotSet`: If `hash_key` is empty
    /// - `InvalidBlockKey`: If `block_key` is present but not a valid AES key
    pub fn new(hash_key: &[u8], block_key: Option<&[u8]>) -> Result<Self, CodecError> {
        Self::with_config(hash_key, block_key, CodecConfig::default())
    }

    /// Create a codec with explicit settings.
    ///
    /// # Errors
    ///
    /// Same as [`Codec::new`].
    pub fn with_config(
        hash_key: &[u8],
        block_key: Option<&[u8]>,
        config: CodecConfig,
    ) -> Result<Self, CodecError> {
        let hash_key = SecretKey::new(hash_key).map_err(|_| CodecError::HashKeyNotSet)?;
        let cipher = block_key
            .map(|key| SecretKey::new(key).and_then(BlockCipher::new))
            .transpose()
            .map_err(CodecError::InvalidBlockKey)?;

        Ok(Self {
            authenticator: Authenticator::new(hash_key, config.mac),
            cipher,
            config,
            serializer: CborSerializer,
            env: SystemEnv::new(),
        })
    }
}

impl<S, E> Codec<S, E> {
    /// Replace the serializer.
    pub fn with_serializer<S2: Serializer>(self, serializer: S2) -> Codec<S2, E> {
        Codec {
            authenticator: self.authenticator,
            cipher: self.cipher,
            config: self.config,
            serializer,
            env: self.env,
        }
    }

    /// Replace the clock and entropy source.
    pub fn with_env<E2: Environment>(self, env: E2) -> Codec<S, E2> {
        Codec {
            authenticator: self.authenticator,
            cipher: self.cipher,
            config: self.config,
            serializer: self.serializer,
            env,
        }
    }

    /// Maximum token age. Zero disables expiry.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.config.max_age = max_age;
        self
    }

    /// Minimum token age. Zero disables the check.
    #[must_use]
    pub fn with_min_age(mut self, min_age: Duration) -> Self {
        self.config.min_age = min_age;
        self
    }

    /// Tolerance for timestamps ahead of the local clock.
    #[must_use]
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.config.clock_skew = clock_skew;
        self
    }

    /// Maximum token length in bytes. Zero disables the check.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.config.max_length = max_length;
        self
    }

    /// MAC algorithm for new and verified tokens.
    #[must_use]
    pub fn with_mac(mut self, mac: MacAlgorithm) -> Self {
        self.config.mac = mac;
        self.authenticator = self.authenticator.with_algorithm(mac);
        self
    }

    /// Current settings.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Returns true if tokens are encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }
}

impl<S: Serializer, E: Environment> Codec<S, E> {
    /// Encode `value` into a token bound to `name`.
    ///
    /// Two calls with the same value produce different tokens when encryption
    /// is enabled (fresh IV) or when the clock has advanced.
    ///
    /// # Errors
    ///
    /// - `Serialization` / `Type`: If the serializer rejects the value
    /// - `Encoding`: If the serialized value is empty
    /// - `Internal`: If the entropy source failed while drawing the IV
    /// - `TooLong`: If the token exceeds `max_length`
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<String, CodecError> {
        let plaintext = self.serializer.serialize(value)?;
        let timestamp = self.env.unix_time();

        let (iv, payload) = match &self.cipher {
            Some(cipher) => {
                let mut iv = [0u8; BLOCK_SIZE];
                self.env.random_bytes(&mut iv).map_err(CodecError::Internal)?;
                let encrypted = cipher.encrypt(&plaintext, iv);
                (Some(encrypted.iv.to_vec()), encrypted.ciphertext)
            },
            None => (None, plaintext),
        };

        let token = Envelope::signed(name, iv, payload, timestamp, &self.authenticator).to_token()?;
        self.check_length(token.len())?;

        tracing::trace!(name, length = token.len(), "token encoded");
        Ok(token)
    }

    /// Decode a token produced by [`encode`](Self::encode) under the same
    /// `name` and keys.
    ///
    /// # Errors
    ///
    /// - `TooLong`: If the token exceeds `max_length` (checked before any
    ///   parsing)
    /// - `Decoding`: If the token is structurally malformed
    /// - `Authentication`: If the MAC does not verify
    /// - `Expired`: If the token is older than `max_age`
    /// - `TooNew`: If the token is younger than `min_age` or timestamped
    ///   further ahead than `clock_skew`
    /// - `Decryption`: If the authenticated ciphertext is malformed
    /// - `Serialization` / `Type`: If the payload does not deserialize into `T`
    pub fn decode<T: DeserializeOwned>(&self, name: &str, token: &str) -> Result<T, CodecError> {
        self.open(name, token).inspect_err(|err| {
            tracing::debug!(name, kind = ?err.kind(), "token rejected");
        })
    }

    fn open<T: DeserializeOwned>(&self, name: &str, token: &str) -> Result<T, CodecError> {
        self.check_length(token.len())?;

        let envelope = Envelope::parse(token, self.cipher.is_some())?;
        envelope.verify(name, &self.authenticator)?;
        self.check_age(envelope.timestamp)?;

        let Envelope { iv, payload, .. } = envelope;
        let plaintext = match (&self.cipher, iv) {
            (Some(cipher), Some(iv)) => {
                let encrypted = EncryptedPayload::from_parts(&iv, payload).map_err(decryption)?;
                cipher.decrypt(&encrypted).map_err(decryption)?
            },
            (None, _) => payload,
            (Some(_), None) => return Err(CodecError::Decryption { reason: "missing IV" }),
        };

        Ok(self.serializer.deserialize(&plaintext)?)
    }

    fn check_length(&self, length: usize) -> Result<(), CodecError> {
        let max_length = self.config.max_length;
        if max_length != 0 && length > max_length {
            return Err(CodecError::TooLong { length, max_length });
        }
        Ok(())
    }

    /// Enforce the validity window on an authenticated timestamp.
    ///
    /// A token is accepted while `age <= max_age`, so a token minted at `t0`
    /// still decodes at exactly `t0 + max_age`.
    fn check_age(&self, timestamp: i64) -> Result<(), CodecError> {
        let age = self.env.unix_time().saturating_sub(timestamp);

        let max_age = self.config.max_age_secs();
        if max_age != 0 && age > max_age {
            return Err(CodecError::Expired { age, max_age: self.config.max_age.as_secs() });
        }

        if age < -self.config.clock_skew_secs() {
            return Err(CodecError::TooNew { age });
        }

        let min_age = self.config.min_age_secs();
        if min_age != 0 && age < min_age {
            return Err(CodecError::TooNew { age });
        }

        Ok(())
    }
}

fn decryption(err: CryptoError) -> CodecError {
    match err {
        CryptoError::DecryptionFailed { reason } => CodecError::Decryption { reason },
        _ => CodecError::Decryption { reason: "decryption failed" },
    }
}
