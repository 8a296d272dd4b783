//! Cookieseal tokens.
//!
//! Encodes serializable values into compact, URL-safe strings that are
//! authenticated (HMAC), optionally encrypted (AES-CTR), timestamped and bound
//! to a name. Decoding verifies all of it before handing a value back, so a
//! client holding a token can carry state without being able to forge or
//! alter it.
//!
//! # Components
//!
//! - [`Codec`]: one hash key, optional block key, validity window
//! - [`encode_multi`] / [`decode_multi`] / [`Rotation`]: key rotation across
//!   an ordered codec list
//! - [`Serializer`]: payload format ([`CborSerializer`], [`JsonSerializer`],
//!   [`RawSerializer`])
//! - [`Environment`]: clock and entropy, swapped out under test
//!
//! # Token Layout
//!
//! ```text
//! base64url( [b64(iv) "|"] b64(payload) "|" timestamp "|" b64(mac) )
//! ```
//!
//! The MAC covers the name, timestamp, IV and payload. See the `codec` module
//! for the order of checks on decode.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod codec;
pub mod config;
pub mod encoding;
pub mod env;
mod envelope;
pub mod error;
mod multi;
pub mod serializer;

pub use codec::Codec;
pub use config::{CodecConfig, DEFAULT_CLOCK_SKEW, DEFAULT_MAX_AGE, DEFAULT_MAX_LENGTH};
pub use cookieseal_crypto::{MacAlgorithm, generate_random_key};
pub use env::{Environment, SystemEnv};
pub use error::{CodecError, ErrorKind};
pub use multi::{Rotation, codecs_from_pairs, decode_multi, encode_multi};
pub use serializer::{CborSerializer, JsonSerializer, RawSerializer, SerializeError, Serializer};
