//! Fuzz target for encode/decode round trips
//!
//! # Strategy
//!
//! - Arbitrary structured values, including empty strings and extremes
//! - Arbitrary hash keys and names
//! - Every AES key size, and no encryption
//! - A single corrupted token byte after each round trip
//!
//! # Invariants
//!
//! - decode(encode(v)) == v
//! - The token is URL-safe and never exceeds the default length limit
//! - Any corrupted token is rejected

#![no_main]

use arbitrary::Arbitrary;
use cookieseal_core::Codec;
use libfuzzer_sys::fuzz_target;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Arbitrary, Serialize, Deserialize)]
struct Cookie {
    b: bool,
    i: i64,
    s: String,
}

#[derive(Debug, Clone, Arbitrary)]
enum BlockKey {
    None,
    Aes128([u8; 16]),
    Aes192([u8; 24]),
    Aes256([u8; 32]),
}

impl BlockKey {
    fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            BlockKey::None => None,
            BlockKey::Aes128(k) => Some(k.as_slice()),
            BlockKey::Aes192(k) => Some(k.as_slice()),
            BlockKey::Aes256(k) => Some(k.as_slice()),
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    hash_key: Vec<u8>,
    block_key: BlockKey,
    name: String,
    value: Cookie,
    corrupt_at: usize,
    corrupt_bit: u8,
}

fuzz_target!(|scenario: Scenario| {
    let codec = match Codec::new(&scenario.hash_key, scenario.block_key.as_bytes()) {
        Ok(codec) => codec,
        Err(err) => {
            assert!(scenario.hash_key.is_empty());
            assert!(err.is_usage());
            return;
        },
    };

    let token = match codec.encode(&scenario.name, &scenario.value) {
        Ok(token) => token,
        Err(err) => {
            // Only oversized values may fail
            assert_eq!(err.kind(), cookieseal_core::ErrorKind::TooLong);
            return;
        },
    };
    assert!(token.len() <= cookieseal_core::DEFAULT_MAX_LENGTH);
    assert!(token.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));

    let decoded: Cookie = codec.decode(&scenario.name, &token).expect("round trip failed");
    assert_eq!(decoded, scenario.value);

    // Flip one low bit; the byte stays ASCII
    let mut bytes = token.into_bytes();
    let index = scenario.corrupt_at % bytes.len();
    bytes[index] ^= 1 << (scenario.corrupt_bit % 7);
    let Ok(corrupted) = String::from_utf8(bytes) else {
        return;
    };
    assert!(codec.decode::<Cookie>(&scenario.name, &corrupted).is_err());
});
