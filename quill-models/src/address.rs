// Copyright (c) 2025 QUILL LABS <info@quill.net>

use crate::error::ModelsError;
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use quill_serialization::{Deserializer, SerializeError, Serializer};
use std::convert::TryInto;
use std::str::FromStr;

/// Size of a serialized address, in bytes
pub const ADDRESS_SIZE_BYTES: usize = 32;

const ADDRESS_PREFIX: char = 'Q';

/// An account address.
///
/// Opaque to the ledger and snapshot layers: only its fixed byte form
/// participates in ordering and storage keys.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address([u8; ADDRESS_SIZE_BYTES]);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            ADDRESS_PREFIX,
            bs58::encode(self.0).with_check().into_string()
        )
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Address {
    /// ## Example
    /// ```rust
    /// # use quill_models::address::Address;
    /// # use std::str::FromStr;
    /// let address = Address::from_bytes(&[42u8; 32]);
    /// let text = address.to_string();
    /// assert_eq!(Address::from_str(&text).unwrap(), address);
    /// ```
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match chars.next() {
            Some(prefix) if prefix == ADDRESS_PREFIX => {
                let data = chars.as_str();
                let decoded_bs58_check = bs58::decode(data)
                    .with_check(None)
                    .into_vec()
                    .map_err(|_| ModelsError::AddressParseError(s.to_string()))?;
                Ok(Address(
                    decoded_bs58_check
                        .as_slice()
                        .try_into()
                        .map_err(|_| ModelsError::AddressParseError(s.to_string()))?,
                ))
            }
            _ => Err(ModelsError::AddressParseError(s.to_string())),
        }
    }
}

impl Address {
    /// Convert to bytes
    pub fn to_bytes(self) -> [u8; ADDRESS_SIZE_BYTES] {
        self.0
    }

    /// Byte view, usable as an ordered storage key
    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE_BYTES] {
        &self.0
    }

    /// Build an address from bytes
    pub fn from_bytes(data: &[u8; ADDRESS_SIZE_BYTES]) -> Address {
        Address(*data)
    }
}

impl ::serde::Serialize for Address {
    /// If the serializer is human readable, serialization uses the
    /// prefixed bs58check string form, the raw bytes otherwise.
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_string())
        } else {
            s.serialize_bytes(self.as_bytes())
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for Address {
    /// Counterpart of the `Serialize` implementation.
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        if d.is_human_readable() {
            struct AddressVisitor;

            impl<'de> ::serde::de::Visitor<'de> for AddressVisitor {
                type Value = Address;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("Q + base58check::encode(bytes)")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    if let Ok(v_str) = std::str::from_utf8(v) {
                        Address::from_str(v_str).map_err(E::custom)
                    } else {
                        Err(E::invalid_value(::serde::de::Unexpected::Bytes(v), &self))
                    }
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Address::from_str(v).map_err(E::custom)
                }
            }
            d.deserialize_str(AddressVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = Address;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("a bytestring")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Ok(Address::from_bytes(v.try_into().map_err(E::custom)?))
                }
            }

            d.deserialize_bytes(BytesVisitor)
        }
    }
}

/// Serializer for `Address`
#[derive(Clone, Default)]
pub struct AddressSerializer;

impl AddressSerializer {
    /// Creates a new `AddressSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Address> for AddressSerializer {
    fn serialize(&self, value: &Address, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }
}

/// Deserializer for `Address`
#[derive(Clone, Default)]
pub struct AddressDeserializer;

impl AddressDeserializer {
    /// Creates a new `AddressDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Address> for AddressDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Address, E> {
        context("Failed address deserialization", |input: &'a [u8]| {
            let (rest, address_bytes) = take(ADDRESS_SIZE_BYTES)(input)?;
            // take() guarantees the exact length
            Ok((rest, Address::from_bytes(address_bytes.try_into().unwrap())))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_serialization::DeserializeError;

    #[test]
    fn test_address_string_roundtrip() {
        let address = Address::from_bytes(&[7u8; ADDRESS_SIZE_BYTES]);
        assert_eq!(Address::from_str(&address.to_string()).unwrap(), address);
    }

    #[test]
    fn test_address_string_rejects_bad_prefix() {
        let address = Address::from_bytes(&[7u8; ADDRESS_SIZE_BYTES]);
        let text = address.to_string().replacen(ADDRESS_PREFIX, "X", 1);
        assert!(Address::from_str(&text).is_err());
        assert!(Address::from_str("").is_err());
    }

    #[test]
    fn test_address_serializer_roundtrip() {
        let address = Address::from_bytes(&[0xAB; ADDRESS_SIZE_BYTES]);
        let mut buffer = Vec::new();
        AddressSerializer::new()
            .serialize(&address, &mut buffer)
            .unwrap();
        buffer.push(0xFF);
        let (rest, out) = AddressDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert_eq!(rest, &[0xFF]);
        assert_eq!(out, address);
    }

    #[test]
    fn test_address_deserializer_rejects_truncated_input() {
        let deser = AddressDeserializer::new();
        assert!(deser
            .deserialize::<DeserializeError>(&[1u8; ADDRESS_SIZE_BYTES - 1])
            .is_err());
    }
}
