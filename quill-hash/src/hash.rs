// Copyright (c) 2025 QUILL LABS <info@quill.net>

use crate::error::QuillHashError;
use crate::HASH_SIZE_BYTES;
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use quill_serialization::{Deserializer, SerializeError, Serializer};
use std::convert::TryInto;
use std::ops::{BitXor, BitXorAssign};
use std::str::FromStr;

/// A BLAKE3 hash of some content
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash)]
pub struct Hash([u8; HASH_SIZE_BYTES]);

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl Hash {
    /// Compute a hash from data.
    ///
    /// # Example
    ///  ```
    /// # use quill_hash::Hash;
    /// let hash = Hash::compute_from(&"hello world".as_bytes());
    /// ```
    pub fn compute_from(data: &[u8]) -> Self {
        Hash(*blake3::hash(data).as_bytes())
    }

    /// The all-zero hash, used as the neutral element of XOR accumulation
    pub const fn zero() -> Self {
        Hash([0u8; HASH_SIZE_BYTES])
    }

    /// Serialize a hash using bs58 encoding with checksum.
    ///
    /// # Example
    ///  ```
    /// # use quill_hash::Hash;
    /// let hash = Hash::compute_from(&"hello world".as_bytes());
    /// let serialized: String = hash.to_bs58_check();
    /// ```
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.to_bytes()).with_check().into_string()
    }

    /// Serialize a hash as bytes
    pub fn to_bytes(&self) -> &[u8; HASH_SIZE_BYTES] {
        &self.0
    }

    /// Convert into bytes
    pub fn into_bytes(self) -> [u8; HASH_SIZE_BYTES] {
        self.0
    }

    /// Deserialize using bs58 encoding with checksum.
    ///
    /// # Example
    ///  ```
    /// # use quill_hash::Hash;
    /// let hash = Hash::compute_from(&"hello world".as_bytes());
    /// let deserialized: Hash = Hash::from_bs58_check(&hash.to_bs58_check()).unwrap();
    /// ```
    pub fn from_bs58_check(data: &str) -> Result<Hash, QuillHashError> {
        let decoded_bs58_check = bs58::decode(data)
            .with_check(None)
            .into_vec()
            .map_err(|err| QuillHashError::ParsingError(format!("{}", err)))?;
        Ok(Hash::from_bytes(
            &decoded_bs58_check
                .as_slice()
                .try_into()
                .map_err(|err| QuillHashError::ParsingError(format!("{}", err)))?,
        ))
    }

    /// Deserialize a hash from bytes
    pub fn from_bytes(data: &[u8; HASH_SIZE_BYTES]) -> Hash {
        Hash(*data)
    }
}

impl BitXorAssign for Hash {
    fn bitxor_assign(&mut self, rhs: Self) {
        *self = *self ^ rhs;
    }
}

impl BitXor for Hash {
    type Output = Self;

    fn bitxor(self, other: Self) -> Self {
        let xored_bytes: Vec<u8> = self
            .to_bytes()
            .iter()
            .zip(other.to_bytes())
            .map(|(x, y)| x ^ y)
            .collect();
        // unwrap won't fail because of the intermediary fixed-size array
        let input_bytes: [u8; HASH_SIZE_BYTES] = xored_bytes.try_into().unwrap();
        Hash::from_bytes(&input_bytes)
    }
}

impl FromStr for Hash {
    type Err = QuillHashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_bs58_check(s)
    }
}

impl ::serde::Serialize for Hash {
    /// If the serializer is human readable, serialization uses the
    /// bs58check string form, the raw bytes otherwise.
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_bs58_check())
        } else {
            s.serialize_bytes(self.to_bytes())
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for Hash {
    /// Counterpart of the `Serialize` implementation.
    ///
    /// # Example
    /// ```
    /// # use quill_hash::Hash;
    /// let hash = Hash::compute_from(&"hello world".as_bytes());
    /// let serialized: String = serde_json::to_string(&hash).unwrap();
    /// let deserialized: Hash = serde_json::from_str(&serialized).unwrap();
    /// assert_eq!(hash, deserialized);
    /// ```
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Hash, D::Error> {
        if d.is_human_readable() {
            struct Base58CheckVisitor;

            impl<'de> ::serde::de::Visitor<'de> for Base58CheckVisitor {
                type Value = Hash;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("an ASCII base58check string")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    if let Ok(v_str) = std::str::from_utf8(v) {
                        Hash::from_bs58_check(v_str).map_err(E::custom)
                    } else {
                        Err(E::invalid_value(::serde::de::Unexpected::Bytes(v), &self))
                    }
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Hash::from_bs58_check(v).map_err(E::custom)
                }
            }
            d.deserialize_str(Base58CheckVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = Hash;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("a bytestring")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Ok(Hash::from_bytes(v.try_into().map_err(E::custom)?))
                }
            }

            d.deserialize_bytes(BytesVisitor)
        }
    }
}

/// Serializer for `Hash`
#[derive(Clone, Default)]
pub struct HashSerializer;

impl HashSerializer {
    /// Creates a new `HashSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Hash> for HashSerializer {
    fn serialize(&self, value: &Hash, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `Hash`
#[derive(Clone, Default)]
pub struct HashDeserializer;

impl HashDeserializer {
    /// Creates a new `HashDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Hash> for HashDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Hash, E> {
        context("Failed hash deserialization", |input: &'a [u8]| {
            let (rest, hash_bytes) = take(HASH_SIZE_BYTES)(input)?;
            // take() guarantees the exact length
            Ok((rest, Hash::from_bytes(hash_bytes.try_into().unwrap())))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_serialization::DeserializeError;

    #[test]
    fn test_hash_bs58_roundtrip() {
        let hash = Hash::compute_from(b"test data");
        let serialized = hash.to_bs58_check();
        assert_eq!(Hash::from_bs58_check(&serialized).unwrap(), hash);
    }

    #[test]
    fn test_hash_bs58_rejects_garbage() {
        assert!(Hash::from_bs58_check("not-a-hash!!").is_err());
        // valid alphabet, wrong length
        assert!(Hash::from_bs58_check("3yZe7d").is_err());
    }

    #[test]
    fn test_hash_serializer_roundtrip() {
        let hash = Hash::compute_from(b"content");
        let mut buffer = Vec::new();
        HashSerializer::new().serialize(&hash, &mut buffer).unwrap();
        let (rest, out) = HashDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, hash);
    }

    #[test]
    fn test_hash_deserializer_rejects_short_input() {
        let deser = HashDeserializer::new();
        assert!(deser.deserialize::<DeserializeError>(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_hash_xor_is_order_independent() {
        let a = Hash::compute_from(b"a");
        let b = Hash::compute_from(b"b");
        let c = Hash::compute_from(b"c");
        let mut left = Hash::zero();
        left ^= a;
        left ^= b;
        left ^= c;
        let mut right = Hash::zero();
        right ^= c;
        right ^= a;
        right ^= b;
        assert_eq!(left, right);
    }
}
