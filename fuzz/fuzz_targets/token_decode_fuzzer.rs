//! Fuzz target for token decoding
//!
//! Feeds arbitrary strings to codecs of every shape (plain, encrypted, each
//! serializer). Inputs are mostly garbage, so this exercises the base64,
//! field split and timestamp parsers ahead of the MAC check.
//!
//! # Invariants
//!
//! - Decode never panics
//! - Every rejection is a decode-class error
//! - Nothing decodes without a valid tag (a random string forging one is
//!   beyond reach)

#![no_main]

use std::collections::HashMap;

use cookieseal_core::{Codec, JsonSerializer, RawSerializer};
use libfuzzer_sys::fuzz_target;

const HASH_KEY: &[u8] = b"fuzz-hash-key";
const BLOCK_KEY: &[u8] = b"fuzz-block-key16";

fuzz_target!(|data: &[u8]| {
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };

    for block_key in [None, Some(BLOCK_KEY)] {
        let Ok(codec) = Codec::new(HASH_KEY, block_key) else {
            return;
        };

        let cbor = codec.decode::<HashMap<String, String>>("fuzz", token);
        assert!(cbor.is_err_and(|err| err.is_decode()));

        let json = codec.clone().with_serializer(JsonSerializer).decode::<String>("fuzz", token);
        assert!(json.is_err_and(|err| err.is_decode()));

        let raw = codec.with_serializer(RawSerializer).decode::<Vec<u8>>("fuzz", token);
        assert!(raw.is_err_and(|err| err.is_decode()));
    }
});
