//! Payload encryption using AES in CTR mode
//!
//! Encryption is pure: the IV is provided by the caller. In production the
//! codec draws it from [`crate::fill_random`] for every token.
//!
//! CTR mode provides confidentiality only. Integrity comes from the HMAC
//! that the codec computes over the IV and ciphertext, and that tag MUST be
//! verified before [`BlockCipher::decrypt`] is called.

use aes::{Aes128, Aes192, Aes256};
use ctr::{
    Ctr128BE,
    cipher::{KeyIvInit, StreamCipher},
};

use crate::{error::CryptoError, keys::SecretKey};

type Aes128Ctr = Ctr128BE<Aes128>;
type Aes192Ctr = Ctr128BE<Aes192>;
type Aes256Ctr = Ctr128BE<Aes256>;

/// AES block size, which is also the IV length (16 bytes)
pub const BLOCK_SIZE: usize = 16;

/// Block key lengths accepted by [`BlockCipher::new`]
const KEY_SIZES: &[usize] = &[16, 24, 32];

/// IV and ciphertext produced by one encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    /// The 16-byte counter block the keystream starts from
    pub iv: [u8; BLOCK_SIZE],
    /// The ciphertext, same length as the plaintext
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Rebuild from separately transported IV and ciphertext.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed`: If the IV is not exactly one block or the
    ///   ciphertext is empty
    pub fn from_parts(iv: &[u8], ciphertext: Vec<u8>) -> Result<Self, CryptoError> {
        let Ok(iv) = <[u8; BLOCK_SIZE]>::try_from(iv) else {
            return Err(CryptoError::DecryptionFailed { reason: "invalid IV length" });
        };
        if ciphertext.is_empty() {
            return Err(CryptoError::DecryptionFailed { reason: "ciphertext is empty" });
        }
        Ok(Self { iv, ciphertext })
    }
}

/// AES-CTR keyed by a block key of 16, 24 or 32 bytes.
#[derive(Debug, Clone)]
pub struct BlockCipher {
    key: SecretKey,
}

impl BlockCipher {
    /// Create a cipher, selecting AES-128/192/256 from the key length.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: If the key is not 16, 24 or 32 bytes
    pub fn new(key: SecretKey) -> Result<Self, CryptoError> {
        if !KEY_SIZES.contains(&key.len()) {
            return Err(CryptoError::InvalidKeyLength { expected: KEY_SIZES, actual: key.len() });
        }
        Ok(Self { key })
    }

    /// Encrypt `plaintext` starting the counter at `iv`.
    ///
    /// # Security
    ///
    /// - Caller MUST supply a fresh IV from a CSPRNG for every call; reusing
    ///   an IV under the same key leaks the XOR of both plaintexts
    pub fn encrypt(&self, plaintext: &[u8], iv: [u8; BLOCK_SIZE]) -> EncryptedPayload {
        let mut ciphertext = plaintext.to_vec();
        self.apply_keystream(&iv, &mut ciphertext);
        EncryptedPayload { iv, ciphertext }
    }

    /// Decrypt a payload produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed`: If the ciphertext is empty
    pub fn decrypt(&self, encrypted: &EncryptedPayload) -> Result<Vec<u8>, CryptoError> {
        if encrypted.ciphertext.is_empty() {
            return Err(CryptoError::DecryptionFailed { reason: "ciphertext is empty" });
        }
        let mut plaintext = encrypted.ciphertext.clone();
        self.apply_keystream(&encrypted.iv, &mut plaintext);
        Ok(plaintext)
    }

    fn apply_keystream(&self, iv: &[u8; BLOCK_SIZE], buffer: &mut [u8]) {
        let key = self.key.as_bytes();

        // Key length was validated in `new`
        match key.len() {
            16 => {
                let Ok(mut cipher) = Aes128Ctr::new_from_slices(key, iv) else {
                    unreachable!("AES-128 key is 16 bytes");
                };
                cipher.apply_keystream(buffer);
            },
            24 => {
                let Ok(mut cipher) = Aes192Ctr::new_from_slices(key, iv) else {
                    unreachable!("AES-192 key is 24 bytes");
                };
                cipher.apply_keystream(buffer);
            },
            _ => {
                let Ok(mut cipher) = Aes256Ctr::new_from_slices(key, iv) else {
                    unreachable!("AES-256 key is 32 bytes");
                };
                cipher.apply_keystream(buffer);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(key: &[u8]) -> BlockCipher {
        BlockCipher::new(SecretKey::new(key.to_vec()).unwrap()).unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = cipher(b"1234567890123456");

        for value in ["foo", "bar", "baz"] {
            let encrypted = cipher.encrypt(value.as_bytes(), [0xAB; BLOCK_SIZE]);
            let decrypted = cipher.decrypt(&encrypted).unwrap();
            assert_eq!(decrypted, value.as_bytes());
        }
    }

    #[test]
    fn all_key_sizes_roundtrip() {
        for len in [16, 24, 32] {
            let cipher = cipher(&vec![0x42; len]);
            let encrypted = cipher.encrypt(b"payload", [0x01; BLOCK_SIZE]);
            assert_eq!(cipher.decrypt(&encrypted).unwrap(), b"payload");
        }
    }

    #[test]
    fn rejects_invalid_key_lengths() {
        for len in [1, 15, 17, 31, 33, 64] {
            let result = BlockCipher::new(SecretKey::new(vec![0u8; len]).unwrap());
            assert!(matches!(
                result,
                Err(CryptoError::InvalidKeyLength { actual, .. }) if actual == len
            ));
        }
    }

    #[test]
    fn matches_nist_sp800_38a_ctr_aes128() {
        // NIST SP 800-38A F.5.1, first block
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let iv: [u8; BLOCK_SIZE] =
            hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap().try_into().unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let encrypted = cipher(&key).encrypt(&plaintext, iv);

        assert_eq!(hex::encode(encrypted.ciphertext), "874d6191b620e3261bef6864990db6ce");
    }

    #[test]
    fn ciphertext_length_equals_plaintext_length() {
        let encrypted = cipher(&[7u8; 32]).encrypt(b"twelve bytes", [0u8; BLOCK_SIZE]);
        assert_eq!(encrypted.ciphertext.len(), 12);
    }

    #[test]
    fn different_ivs_produce_different_ciphertexts() {
        let cipher = cipher(&[7u8; 16]);

        let a = cipher.encrypt(b"same plaintext", [0x00; BLOCK_SIZE]);
        let b = cipher.encrypt(b"same plaintext", [0xFF; BLOCK_SIZE]);

        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn from_parts_restores_payload() {
        let encrypted = cipher(&[7u8; 16]).encrypt(b"abc", [0x11; BLOCK_SIZE]);
        let restored =
            EncryptedPayload::from_parts(&encrypted.iv, encrypted.ciphertext.clone()).unwrap();

        assert_eq!(restored, encrypted);
    }

    #[test]
    fn from_parts_rejects_bad_iv() {
        let result = EncryptedPayload::from_parts(&[0u8; 8], vec![1, 2, 3]);
        assert_eq!(result, Err(CryptoError::DecryptionFailed { reason: "invalid IV length" }));

        let result = EncryptedPayload::from_parts(&[0u8; BLOCK_SIZE + 1], vec![1, 2, 3]);
        assert!(result.is_err());
    }

    #[test]
    fn from_parts_rejects_empty_ciphertext() {
        let result = EncryptedPayload::from_parts(&[0u8; BLOCK_SIZE], Vec::new());
        assert_eq!(result, Err(CryptoError::DecryptionFailed { reason: "ciphertext is empty" }));
    }

    #[test]
    fn decrypt_rejects_empty_ciphertext() {
        let empty = EncryptedPayload { iv: [0u8; BLOCK_SIZE], ciphertext: Vec::new() };
        assert!(cipher(&[7u8; 16]).decrypt(&empty).is_err());
    }
}
