//! Key rotation across an ordered list of codecs.
//!
//! The first codec is the primary: it encodes every new token. Decoding tries
//! each codec in order and returns the first success, so tokens minted under a
//! retired key keep working for as long as its codec stays in the list.
//!
//! ```text
//! codecs:  [ new keys, previous keys, older keys ]
//! encode:    new keys
//! decode:    new keys -> previous keys -> older keys   (first success wins)
//! ```

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    codec::Codec,
    env::Environment,
    error::CodecError,
    serializer::Serializer,
};

/// Encode with the first codec in `codecs`.
///
/// # Errors
///
/// - `NoCodecs`: If `codecs` is empty
/// - Any error from [`Codec::encode`] on the primary codec
pub fn encode_multi<S, E, T>(
    name: &str,
    value: &T,
    codecs: &[Codec<S, E>],
) -> Result<String, CodecError>
where
    S: Serializer,
    E: Environment,
    T: Serialize + ?Sized,
{
    let Some(primary) = codecs.first() else {
        return Err(CodecError::NoCodecs);
    };
    primary.encode(name, value)
}

/// Decode with each codec in order until one succeeds.
///
/// # Errors
///
/// - `NoCodecs`: If `codecs` is empty
/// - `Multi`: If every codec failed, carrying one error per codec in order
pub fn decode_multi<S, E, T>(
    name: &str,
    token: &str,
    codecs: &[Codec<S, E>],
) -> Result<T, CodecError>
where
    S: Serializer,
    E: Environment,
    T: DeserializeOwned,
{
    if codecs.is_empty() {
        return Err(CodecError::NoCodecs);
    }

    let mut errors = Vec::with_capacity(codecs.len());
    for (index, codec) in codecs.iter().enumerate() {
        match codec.decode(name, token) {
            Ok(value) => {
                tracing::debug!(name, index, "token accepted");
                return Ok(value);
            },
            Err(err) => errors.push(err),
        }
    }

    Err(CodecError::Multi(errors))
}

/// Build default codecs from `(hash_key, block_key)` pairs, newest first.
///
/// # Errors
///
/// - `HashKeyNotSet` / `InvalidBlockKey`: From the first pair that is not a
///   valid key set
pub fn codecs_from_pairs<'a, I>(pairs: I) -> Result<Vec<Codec>, CodecError>
where
    I: IntoIterator<Item = (&'a [u8], Option<&'a [u8]>)>,
{
    pairs.into_iter().map(|(hash_key, block_key)| Codec::new(hash_key, block_key)).collect()
}

/// Owned codec list with the rotation semantics of [`encode_multi`] and
/// [`decode_multi`].
#[derive(Debug, Clone)]
pub struct Rotation<S, E> {
    codecs: Vec<Codec<S, E>>,
}

impl<S: Serializer, E: Environment> Rotation<S, E> {
    /// Wrap `codecs`, primary first.
    ///
    /// # Errors
    ///
    /// - `NoCodecs`: If `codecs` is empty
    pub fn new(codecs: Vec<Codec<S, E>>) -> Result<Self, CodecError> {
        if codecs.is_empty() {
            return Err(CodecError::NoCodecs);
        }
        Ok(Self { codecs })
    }

    /// Encode with the primary codec.
    ///
    /// # Errors
    ///
    /// Same as [`Codec::encode`].
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<String, CodecError> {
        encode_multi(name, value, &self.codecs)
    }

    /// Decode with the first codec that accepts the token.
    ///
    /// # Errors
    ///
    /// - `Multi`: If every codec failed
    pub fn decode<T: DeserializeOwned>(&self, name: &str, token: &str) -> Result<T, CodecError> {
        decode_multi(name, token, &self.codecs)
    }

    /// Codecs in priority order.
    pub fn codecs(&self) -> &[Codec<S, E>] {
        &self.codecs
    }
}
