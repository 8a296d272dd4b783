//! Value serialization for token payloads.
//!
//! A codec is parameterized by a [`Serializer`], chosen at construction:
//!
//! - [`CborSerializer`] (default): self-describing binary, handles nested
//!   maps and custom structs without registration
//! - [`JsonSerializer`]: JSON, for tokens that other stacks must read
//! - [`RawSerializer`]: passthrough for values that are already bytes
//!
//! # Invariants
//!
//! `deserialize(serialize(v)) == v` for every value the serializer accepts.
//!
//! Error text names the failure category and position only. Format errors
//! never quote the value or payload they were produced from.

mod raw;

use std::fmt;

pub use raw::RawSerializer;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::error::Category;
use thiserror::Error;

/// Errors from serializing or deserializing a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// The value or destination has a shape this serializer cannot handle
    #[error("unsupported type: expected {expected}")]
    Type {
        /// What the serializer accepts
        expected: &'static str,
    },

    /// The underlying format rejected the value or bytes
    #[error("{0}")]
    Format(String),
}

// Custom messages can quote the value being processed, so they are dropped
impl serde::ser::Error for SerializeError {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self::Format("value cannot be serialized".to_string())
    }
}

impl serde::de::Error for SerializeError {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self::Format("payload does not match the destination type".to_string())
    }
}

/// Converts values to and from payload bytes.
pub trait Serializer: Send + Sync {
    /// Encode `value` into bytes.
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializeError>;

    /// Decode bytes into a value of type `T`.
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializeError>;
}

/// CBOR serializer (default).
#[derive(Debug, Clone, Copy, Default)]
pub struct CborSerializer;

impl Serializer for CborSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializeError> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(value, &mut bytes).map_err(cbor_encode_error)?;
        Ok(bytes)
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializeError> {
        ciborium::de::from_reader(bytes).map_err(cbor_decode_error)
    }
}

fn cbor_encode_error<T>(err: ciborium::ser::Error<T>) -> SerializeError {
    let reason = match err {
        ciborium::ser::Error::Io(_) => "cbor write failed",
        ciborium::ser::Error::Value(_) => "value cannot be represented in cbor",
    };
    SerializeError::Format(reason.to_string())
}

fn cbor_decode_error<T>(err: ciborium::de::Error<T>) -> SerializeError {
    let message = match err {
        ciborium::de::Error::Io(_) => "cbor read failed".to_string(),
        ciborium::de::Error::Syntax(offset) => format!("malformed cbor at offset {offset}"),
        ciborium::de::Error::Semantic(Some(offset), _) => {
            format!("cbor does not match the destination type at offset {offset}")
        },
        ciborium::de::Error::Semantic(None, _) => {
            "cbor does not match the destination type".to_string()
        },
        ciborium::de::Error::RecursionLimitExceeded => "cbor nesting too deep".to_string(),
    };
    SerializeError::Format(message)
}

/// JSON serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializeError> {
        serde_json::to_vec(value).map_err(|e| json_error(&e))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializeError> {
        serde_json::from_slice(bytes).map_err(|e| json_error(&e))
    }
}

fn json_error(err: &serde_json::Error) -> SerializeError {
    let reason = match err.classify() {
        Category::Io => "json i/o failed",
        Category::Syntax => "malformed json",
        Category::Data => "json does not match the destination type",
        Category::Eof => "truncated json",
    };
    if err.line() == 0 {
        return SerializeError::Format(reason.to_string());
    }
    SerializeError::Format(format!("{reason} at line {} column {}", err.line(), err.column()))
}
