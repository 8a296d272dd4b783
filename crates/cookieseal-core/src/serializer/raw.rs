//! Passthrough serializer for values that are already bytes.
//!
//! Accepts byte sequences in any of their serde shapes (`serialize_bytes`,
//! a sequence of `u8`, a `u8` tuple/array, or a newtype around one of those)
//! and copies them through untouched. Anything else is a `Type` error, in
//! both directions. On decode each element is offered only as a `u8`, so
//! destinations such as `Vec<u64>` or `(u32, u32)` are rejected.
//!
//! Sets of `u8` request the same serde sequence protocol as `Vec<u8>` and
//! cannot be told apart from it by a deserializer; decode into a sequence
//! type, not a set.

use serde::{
    Serialize,
    de::{DeserializeOwned, DeserializeSeed, SeqAccess, Visitor},
    forward_to_deserialize_any,
    ser::{Impossible, SerializeSeq, SerializeTuple},
};

use super::{SerializeError, Serializer};

const BYTES: &str = "a byte sequence";
const BYTE: &str = "a byte sequence element (u8)";

/// Raw-bytes serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSerializer;

impl Serializer for RawSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializeError> {
        value.serialize(ByteCollector)
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializeError> {
        T::deserialize(ByteSource(bytes))
    }
}

/// Rejections shared by both byte serializers.
macro_rules! reject_non_bytes {
    ($expected:expr) => {
        fn serialize_bool(self, _v: bool) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_i8(self, _v: i8) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_i16(self, _v: i16) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_i32(self, _v: i32) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_i64(self, _v: i64) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_u16(self, _v: u16) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_u32(self, _v: u32) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_u64(self, _v: u64) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_f32(self, _v: f32) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_f64(self, _v: f64) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_char(self, _v: char) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_str(self, _v: &str) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_some<T: Serialize + ?Sized>(
            self,
            _value: &T,
        ) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_unit_variant(
            self,
            _name: &'static str,
            _variant_index: u32,
            _variant: &'static str,
        ) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_newtype_variant<T: Serialize + ?Sized>(
            self,
            _name: &'static str,
            _variant_index: u32,
            _variant: &'static str,
            _value: &T,
        ) -> Result<Self::Ok, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_tuple_struct(
            self,
            _name: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeTupleStruct, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_tuple_variant(
            self,
            _name: &'static str,
            _variant_index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeTupleVariant, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_struct(
            self,
            _name: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeStruct, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
        fn serialize_struct_variant(
            self,
            _name: &'static str,
            _variant_index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeStructVariant, Self::Error> {
            Err(SerializeError::Type { expected: $expected })
        }
    };
}

/// Top-level serializer: collects the value's bytes.
struct ByteCollector;

impl serde::Serializer for ByteCollector {
    type Ok = Vec<u8>;
    type Error = SerializeError;
    type SerializeSeq = ByteSeq;
    type SerializeTuple = ByteSeq;
    type SerializeTupleStruct = Impossible<Vec<u8>, SerializeError>;
    type SerializeTupleVariant = Impossible<Vec<u8>, SerializeError>;
    type SerializeMap = Impossible<Vec<u8>, SerializeError>;
    type SerializeStruct = Impossible<Vec<u8>, SerializeError>;
    type SerializeStructVariant = Impossible<Vec<u8>, SerializeError>;

    reject_non_bytes!(BYTES);

    fn serialize_u8(self, _v: u8) -> Result<Vec<u8>, SerializeError> {
        Err(SerializeError::Type { expected: BYTES })
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Vec<u8>, SerializeError> {
        Ok(v.to_vec())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Vec<u8>, SerializeError> {
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ByteSeq, SerializeError> {
        Ok(ByteSeq { bytes: Vec::with_capacity(len.unwrap_or(0)) })
    }

    fn serialize_tuple(self, len: usize) -> Result<ByteSeq, SerializeError> {
        Ok(ByteSeq { bytes: Vec::with_capacity(len) })
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

/// Accumulates `u8` elements of a sequence or array.
struct ByteSeq {
    bytes: Vec<u8>,
}

impl SerializeSeq for ByteSeq {
    type Ok = Vec<u8>;
    type Error = SerializeError;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), SerializeError> {
        self.bytes.push(value.serialize(ByteElement)?);
        Ok(())
    }

    fn end(self) -> Result<Vec<u8>, SerializeError> {
        Ok(self.bytes)
    }
}

impl SerializeTuple for ByteSeq {
    type Ok = Vec<u8>;
    type Error = SerializeError;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), SerializeError> {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Vec<u8>, SerializeError> {
        SerializeSeq::end(self)
    }
}

/// Element serializer: accepts a single `u8`.
struct ByteElement;

impl serde::Serializer for ByteElement {
    type Ok = u8;
    type Error = SerializeError;
    type SerializeSeq = Impossible<u8, SerializeError>;
    type SerializeTuple = Impossible<u8, SerializeError>;
    type SerializeTupleStruct = Impossible<u8, SerializeError>;
    type SerializeTupleVariant = Impossible<u8, SerializeError>;
    type SerializeMap = Impossible<u8, SerializeError>;
    type SerializeStruct = Impossible<u8, SerializeError>;
    type SerializeStructVariant = Impossible<u8, SerializeError>;

    reject_non_bytes!(BYTE);

    fn serialize_u8(self, v: u8) -> Result<u8, SerializeError> {
        Ok(v)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<u8, SerializeError> {
        Err(SerializeError::Type { expected: BYTE })
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _value: &T,
    ) -> Result<u8, SerializeError> {
        Err(SerializeError::Type { expected: BYTE })
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, SerializeError> {
        Err(SerializeError::Type { expected: BYTE })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, SerializeError> {
        Err(SerializeError::Type { expected: BYTE })
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

/// Deserializer that only offers its input as bytes.
struct ByteSource<'de>(&'de [u8]);

impl<'de> serde::Deserializer<'de> for ByteSource<'de> {
    type Error = SerializeError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, SerializeError> {
        Err(SerializeError::Type { expected: BYTES })
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SerializeError> {
        visitor.visit_borrowed_bytes(self.0)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SerializeError> {
        visitor.visit_byte_buf(self.0.to_vec())
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SerializeError> {
        let mut elements = ByteElements(self.0.iter());
        let value = visitor.visit_seq(&mut elements)?;
        // Arrays shorter than the payload must not silently truncate it
        if !elements.0.as_slice().is_empty() {
            return Err(SerializeError::Format("payload has trailing bytes".to_string()));
        }
        Ok(value)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, SerializeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, SerializeError> {
        visitor.visit_newtype_struct(self)
    }

    fn is_human_readable(&self) -> bool {
        false
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        option unit unit_struct tuple_struct map struct enum identifier ignored_any
    }
}

/// Sequence access over the payload, one byte per element.
struct ByteElements<'de>(std::slice::Iter<'de, u8>);

impl<'de> SeqAccess<'de> for ByteElements<'de> {
    type Error = SerializeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, SerializeError> {
        self.0.next().map(|&byte| seed.deserialize(ByteValue(byte))).transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

/// Element deserializer: answers only `u8` requests.
struct ByteValue(u8);

impl<'de> serde::Deserializer<'de> for ByteValue {
    type Error = SerializeError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, SerializeError> {
        Err(SerializeError::Type { expected: BYTE })
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SerializeError> {
        visitor.visit_u8(self.0)
    }

    fn is_human_readable(&self) -> bool {
        false
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u16 u32 u64 u128 f32 f64 char str string bytes byte_buf
        option unit unit_struct newtype_struct seq tuple tuple_struct map struct enum
        identifier ignored_any
    }
}
