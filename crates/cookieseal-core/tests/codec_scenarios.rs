//! Scenario tests for token codecs.
//!
//! Covers the behaviors a web application relies on: sessions surviving a
//! round trip, forged and stale tokens being rejected, key rotation, and
//! sharing one codec between threads.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    thread,
    time::Duration,
};

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};
use cookieseal_core::{
    Codec, CodecError, Environment, ErrorKind, JsonSerializer, RawSerializer, Rotation,
    codecs_from_pairs, decode_multi, encode_multi,
};
use cookieseal_crypto::{CryptoError, fill_random};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
struct TestEnv {
    now: Arc<AtomicI64>,
}

impl TestEnv {
    fn at(now: i64) -> Self {
        Self { now: Arc::new(AtomicI64::new(now)) }
    }

    fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Environment for TestEnv {
    fn unix_time(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError> {
        fill_random(buffer)
    }
}

const NOW: i64 = 1_700_000_000;
const HASH_KEY: &[u8] = b"12345";
const BLOCK_KEY: &[u8] = b"1234567890123456";

type Session = HashMap<String, String>;

fn session(key: &str, value: &str) -> Session {
    HashMap::from([(key.to_string(), value.to_string())])
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct FooBar {
    foo: i64,
    bar: String,
}

#[test]
fn concrete_scenario() {
    let codec = Codec::new(HASH_KEY, None).unwrap();
    let value = session("foo", "bar");

    let token = codec.encode("sid", &value).unwrap();
    assert_eq!(codec.decode::<Session>("sid", &token).unwrap(), value);

    let other = Codec::new(b"54321", None).unwrap();
    assert_eq!(other.decode::<Session>("sid", &token).unwrap_err(), CodecError::Authentication);
}

#[test]
fn session_roundtrip_and_forgery() {
    let codec = Codec::new(HASH_KEY, Some(BLOCK_KEY)).unwrap();

    for value in [session("foo", "bar"), session("baz", "ding")] {
        let token = codec.encode("sid", &value).unwrap();
        assert_eq!(codec.decode::<Session>("sid", &token).unwrap(), value);

        let forger = Codec::new(b"54321", Some(BLOCK_KEY)).unwrap();
        let err = forger.decode::<Session>("sid", &token).unwrap_err();
        assert_eq!(err, CodecError::Authentication);
    }
}

#[test]
fn cookie_name_prefixes_are_not_normalized() {
    let codec = Codec::new(HASH_KEY, None).unwrap();
    let token = codec.encode("__Secure-sid", &session("foo", "bar")).unwrap();

    let err = codec.decode::<Session>("__Host-sid", &token).unwrap_err();
    assert_eq!(err, CodecError::Authentication);
    assert!(codec.decode::<Session>("__Secure-sid", &token).is_ok());
}

#[test]
fn expiry_window() {
    let env = TestEnv::at(NOW);
    let codec = Codec::new(HASH_KEY, None)
        .unwrap()
        .with_env(env.clone())
        .with_max_age(Duration::from_secs(3600));
    let token = codec.encode("sid", &session("foo", "bar")).unwrap();

    env.set(NOW + 3600);
    assert!(codec.decode::<Session>("sid", &token).is_ok());

    env.set(NOW + 3601);
    let err = codec.decode::<Session>("sid", &token).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Expired);
    assert!(err.is_decode());
    assert_eq!(err.to_string(), "the token has expired");
}

#[test]
fn minimum_age_and_future_tokens() {
    let env = TestEnv::at(NOW);
    let codec = Codec::new(HASH_KEY, None)
        .unwrap()
        .with_env(env.clone())
        .with_min_age(Duration::from_secs(30))
        .with_clock_skew(Duration::ZERO);
    let token = codec.encode("sid", "v").unwrap();

    env.set(NOW + 29);
    assert_eq!(codec.decode::<String>("sid", &token).unwrap_err().kind(), ErrorKind::TooNew);

    env.set(NOW + 30);
    assert_eq!(codec.decode::<String>("sid", &token).unwrap(), "v");

    // Minted one second in the future, no skew allowed
    env.set(NOW - 1);
    assert_eq!(codec.decode::<String>("sid", &token).unwrap_err(), CodecError::TooNew { age: -1 });
}

#[test]
fn malformed_tokens_are_decoding_errors() {
    let plain = Codec::new(HASH_KEY, None).unwrap();
    let encrypted = Codec::new(HASH_KEY, Some(BLOCK_KEY)).unwrap();

    let mut inputs: Vec<String> = vec![
        String::new(),
        "!".to_string(),
        "not a token".to_string(),
        "a|b|c".to_string(),
        "x".repeat(100),
    ];
    for raw in [
        "", " ", "\n", "||", "|||", "cookie", "|", "a|b", "a|b|c|d", "Zm9v|abc|Zm9v", "Zm9v|1|",
        "|1|Zm9v",
    ] {
        inputs.push(URL_SAFE_NO_PAD.encode(raw));
        inputs.push(URL_SAFE.encode(raw));
        inputs.push(STANDARD.encode(raw));
        inputs.push(STANDARD_NO_PAD.encode(raw));
    }

    for input in &inputs {
        for err in [
            plain.decode::<String>("sid", input).unwrap_err(),
            encrypted.decode::<String>("sid", input).unwrap_err(),
        ] {
            assert!(err.is_decode(), "{input:?} gave {err:?}");
            assert!(
                matches!(err.kind(), ErrorKind::Decoding | ErrorKind::Authentication),
                "{input:?} gave {err:?}"
            );
        }
    }
}

#[test]
fn padded_token_is_rejected() {
    let codec = Codec::new(HASH_KEY, None).unwrap();
    let token = codec.encode("sid", "value").unwrap();

    let padded = URL_SAFE.encode(URL_SAFE_NO_PAD.decode(&token).unwrap());
    if padded != token {
        assert_eq!(codec.decode::<String>("sid", &padded).unwrap_err().kind(), ErrorKind::Decoding);
    }
}

#[test]
fn rejections_do_not_reveal_stage() {
    let codec = Codec::new(HASH_KEY, Some(BLOCK_KEY)).unwrap();
    let token = codec.encode("sid", "v").unwrap();

    let malformed = codec.decode::<String>("sid", "!!!").unwrap_err();
    let forged = codec.decode::<String>("other", &token).unwrap_err();

    assert_ne!(malformed.kind(), forged.kind());
    assert_eq!(malformed.to_string(), forged.to_string());
}

#[test]
fn shape_mismatch_keeps_plaintext_out_of_errors() {
    let secret = "alice-secret-password";

    for codec in [
        Codec::new(HASH_KEY, Some(BLOCK_KEY)).unwrap().with_serializer(JsonSerializer),
        Codec::new(HASH_KEY, None).unwrap().with_serializer(JsonSerializer),
    ] {
        let token = codec.encode("sid", secret).unwrap();
        let err = codec.decode::<u64>("sid", &token).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert!(!err.to_string().contains(secret), "{err}");
        assert!(!format!("{err:?}").contains(secret), "{err:?}");
    }

    let cbor = Codec::new(HASH_KEY, Some(BLOCK_KEY)).unwrap();
    let token = cbor.encode("sid", secret).unwrap();
    let err = cbor.decode::<FooBar>("sid", &token).unwrap_err();
    assert!(!format!("{err:?}").contains(secret), "{err:?}");
}

#[test]
fn length_limit() {
    let codec = Codec::new(HASH_KEY, None).unwrap();
    let big = "x".repeat(5000);

    let err = codec.encode("sid", &big).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooLong);

    let roomy = Codec::new(HASH_KEY, None).unwrap().with_max_length(0);
    let token = roomy.encode("sid", &big).unwrap();
    assert_eq!(roomy.decode::<String>("sid", &token).unwrap(), big);
    assert_eq!(codec.decode::<String>("sid", &token).unwrap_err().kind(), ErrorKind::TooLong);
}

#[test]
fn custom_struct_roundtrip() {
    let value = FooBar { foo: 42, bar: "bar".to_string() };

    let cbor = Codec::new(HASH_KEY, Some(BLOCK_KEY)).unwrap();
    let token = cbor.encode("foobar", &value).unwrap();
    assert_eq!(cbor.decode::<FooBar>("foobar", &token).unwrap(), value);

    let json = Codec::new(HASH_KEY, Some(BLOCK_KEY)).unwrap().with_serializer(JsonSerializer);
    let token = json.encode("foobar", &value).unwrap();
    assert_eq!(json.decode::<FooBar>("foobar", &token).unwrap(), value);
}

#[test]
fn json_payload_is_readable_without_block_key() {
    let codec = Codec::new(HASH_KEY, None).unwrap().with_serializer(JsonSerializer);
    let token = codec.encode("sid", &session("foo", "bar")).unwrap();

    let joined = String::from_utf8(URL_SAFE_NO_PAD.decode(&token).unwrap()).unwrap();
    let payload_field = joined.split('|').next().unwrap();
    let payload = URL_SAFE_NO_PAD.decode(payload_field).unwrap();

    assert_eq!(payload, br#"{"foo":"bar"}"#);
}

#[test]
fn raw_codec_carries_bytes() {
    let codec = Codec::new(HASH_KEY, Some(BLOCK_KEY)).unwrap().with_serializer(RawSerializer);
    let value = vec![0u8, 1, 2, 254, 255];

    let token = codec.encode("blob", &value).unwrap();
    assert_eq!(codec.decode::<Vec<u8>>("blob", &token).unwrap(), value);

    let err = codec.encode("blob", &session("foo", "bar")).unwrap_err();
    assert!(err.is_usage());
}

#[test]
fn key_rotation() {
    let old = Codec::new(b"old-hash", Some(b"old-block-key-16".as_slice())).unwrap();
    let new = Codec::new(b"new-hash", Some(b"new-block-key-16".as_slice())).unwrap();

    let old_token = old.encode("sid", &session("user", "alice")).unwrap();

    let codecs = vec![new, old];
    let value: Session = decode_multi("sid", &old_token, &codecs).unwrap();
    assert_eq!(value, session("user", "alice"));

    // New tokens come from the primary only
    let new_token = encode_multi("sid", &session("user", "bob"), &codecs).unwrap();
    assert!(codecs[1].decode::<Session>("sid", &new_token).is_err());
    assert!(codecs[0].decode::<Session>("sid", &new_token).is_ok());
}

#[test]
fn rotation_reports_every_failure() {
    let pairs: [(&[u8], Option<&[u8]>); 2] = [(b"a", None), (b"b", None)];
    let rotation = Rotation::new(codecs_from_pairs(pairs).unwrap()).unwrap();
    let token = Codec::new(b"c", None).unwrap().encode("sid", "v").unwrap();

    let err = rotation.decode::<String>("sid", &token).unwrap_err();
    match err {
        CodecError::Multi(errors) => {
            assert_eq!(errors, vec![CodecError::Authentication, CodecError::Authentication]);
        },
        other => panic!("expected Multi, got {other:?}"),
    }
}

#[test]
fn shared_codec_across_threads() {
    let codec = Arc::new(Codec::new(HASH_KEY, Some(BLOCK_KEY)).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let codec = Arc::clone(&codec);
            thread::spawn(move || {
                for j in 0..50 {
                    let value = session("n", &format!("{i}-{j}"));
                    let token = codec.encode("sid", &value).unwrap();
                    assert_eq!(codec.decode::<Session>("sid", &token).unwrap(), value);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
