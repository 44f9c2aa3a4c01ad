// Copyright (c) 2025 QUILL LABS <info@quill.net>

use nom::error::{context, ContextError, ParseError};
use nom::multi::length_data;
use nom::{IResult, Parser};
use quill_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use std::ops::Bound;

/// Serializer for `Vec<u8>`: varint byte length followed by the raw bytes
#[derive(Clone, Default)]
pub struct VecU8Serializer {
    u64_serializer: U64VarIntSerializer,
}

impl VecU8Serializer {
    /// Creates a new `VecU8Serializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<Vec<u8>> for VecU8Serializer {
    fn serialize(&self, value: &Vec<u8>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&(value.len() as u64), buffer)?;
        buffer.extend_from_slice(value);
        Ok(())
    }
}

/// Deserializer for `Vec<u8>`, with a bounded byte length
#[derive(Clone)]
pub struct VecU8Deserializer {
    varint_u64_deserializer: U64VarIntDeserializer,
}

impl VecU8Deserializer {
    /// Creates a new `VecU8Deserializer` accepting only lengths within the
    /// given bounds
    pub const fn new(min_length: Bound<u64>, max_length: Bound<u64>) -> Self {
        Self {
            varint_u64_deserializer: U64VarIntDeserializer::new(min_length, max_length),
        }
    }
}

impl Deserializer<Vec<u8>> for VecU8Deserializer {
    /// ```
    /// use quill_models::serialization::{VecU8Deserializer, VecU8Serializer};
    /// use quill_serialization::{DeserializeError, Deserializer, Serializer};
    /// use std::ops::Bound::Included;
    ///
    /// let data = vec![1u8, 2, 3];
    /// let mut buffer = Vec::new();
    /// VecU8Serializer::new().serialize(&data, &mut buffer).unwrap();
    /// let deser = VecU8Deserializer::new(Included(0), Included(u64::MAX));
    /// let (rest, out) = deser.deserialize::<DeserializeError>(&buffer).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(out, data);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<u8>, E> {
        context("Failed Vec<u8> deserialization", |input| {
            length_data(|input| self.varint_u64_deserializer.deserialize(input))
                .map(|data: &[u8]| data.to_vec())
                .parse(input)
        })(buffer)
    }
}
