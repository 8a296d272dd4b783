//! Cookieseal Cryptographic Primitives
//!
//! Cryptographic building blocks for cookieseal tokens. The MAC and cipher
//! operations are pure functions of their inputs: the caller supplies the IV,
//! so encryption stays deterministic under test. Randomness lives in
//! [`fill_random`] and [`generate_random_key`], both backed by the OS CSPRNG.
//!
//! # Envelope Protection
//!
//! A token payload is protected encrypt-then-MAC. The optional block key
//! drives AES-CTR; the hash key drives an HMAC over everything that ends up
//! on the wire.
//!
//! ```text
//! Serialized value
//!        │
//!        ▼ (block key configured)
//! AES-CTR(block key, random IV) → IV || ciphertext
//!        │
//!        ▼
//! HMAC(hash key, name || timestamp || IV || ciphertext) → tag
//! ```
//!
//! # Security
//!
//! Integrity:
//! - The tag covers the token name, so a token minted for one slot is
//!   rejected in another
//! - Every context field is length-prefixed; no two field splits produce the
//!   same MAC input
//! - Tags are compared with `subtle::ConstantTimeEq`
//!
//! Confidentiality:
//! - CTR mode needs a unique IV per key; IVs are drawn fresh from the OS
//!   CSPRNG for every encryption and RNG failure is reported, never papered
//!   over
//!
//! Key hygiene:
//! - Keys live in [`SecretKey`], zeroized on drop and redacted in `Debug`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cipher;
pub mod error;
pub mod keys;
pub mod mac;

pub use cipher::{BLOCK_SIZE, BlockCipher, EncryptedPayload};
pub use error::CryptoError;
pub use keys::{SecretKey, fill_random, generate_random_key};
pub use mac::{Authenticator, MacAlgorithm, mac_context};
