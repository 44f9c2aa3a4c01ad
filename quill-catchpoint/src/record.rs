// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! One account row as it travels inside a catchpoint: the address plus the
//! opaque versioned account data blob. The snapshot layer never interprets
//! the blob beyond its length.

use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use quill_models::address::{Address, AddressDeserializer, AddressSerializer};
use quill_models::serialization::{VecU8Deserializer, VecU8Serializer};
use quill_serialization::{Deserializer, SerializeError, Serializer};
use std::ops::Bound::Included;

/// One account balance record of a catchpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRecord {
    /// account address
    pub address: Address,
    /// opaque versioned account data
    pub account_data: Vec<u8>,
}

/// Serializer for `BalanceRecord`
#[derive(Clone, Default)]
pub struct BalanceRecordSerializer {
    address_serializer: AddressSerializer,
    data_serializer: VecU8Serializer,
}

impl BalanceRecordSerializer {
    /// Creates a new `BalanceRecordSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            data_serializer: VecU8Serializer::new(),
        }
    }
}

impl Serializer<BalanceRecord> for BalanceRecordSerializer {
    fn serialize(&self, value: &BalanceRecord, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.address, buffer)?;
        self.data_serializer.serialize(&value.account_data, buffer)
    }
}

/// Deserializer for `BalanceRecord`, hardened against untrusted input
#[derive(Clone)]
pub struct BalanceRecordDeserializer {
    address_deserializer: AddressDeserializer,
    data_deserializer: VecU8Deserializer,
}

impl BalanceRecordDeserializer {
    /// Creates a new `BalanceRecordDeserializer` rejecting account data
    /// blobs longer than `max_account_data_len`
    pub const fn new(max_account_data_len: u64) -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            data_deserializer: VecU8Deserializer::new(
                Included(0),
                Included(max_account_data_len),
            ),
        }
    }
}

impl Deserializer<BalanceRecord> for BalanceRecordDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BalanceRecord, E> {
        context("Failed balance record deserialization", |input| {
            tuple((
                context("Failed address deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed account data deserialization", |input| {
                    self.data_deserializer.deserialize(input)
                }),
            ))
            .map(|(address, account_data)| BalanceRecord {
                address,
                account_data,
            })
            .parse(input)
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_serialization::DeserializeError;

    fn make_record() -> BalanceRecord {
        BalanceRecord {
            address: Address::from_bytes(&[3u8; 32]),
            account_data: vec![0xDE, 0xAD, 0xBE, 0xEF],
        }
    }

    #[test]
    fn test_record_roundtrip() {
        let record = make_record();
        let mut buffer = Vec::new();
        BalanceRecordSerializer::new()
            .serialize(&record, &mut buffer)
            .unwrap();
        let (rest, out) = BalanceRecordDeserializer::new(1024)
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, record);
    }

    #[test]
    fn test_record_roundtrip_empty_data() {
        let record = BalanceRecord {
            address: Address::from_bytes(&[9u8; 32]),
            account_data: Vec::new(),
        };
        let mut buffer = Vec::new();
        BalanceRecordSerializer::new()
            .serialize(&record, &mut buffer)
            .unwrap();
        let (rest, out) = BalanceRecordDeserializer::new(1024)
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, record);
    }

    #[test]
    fn test_record_rejects_truncated_input() {
        let record = make_record();
        let mut buffer = Vec::new();
        BalanceRecordSerializer::new()
            .serialize(&record, &mut buffer)
            .unwrap();
        let deser = BalanceRecordDeserializer::new(1024);
        for len in 0..buffer.len() {
            assert!(
                deser.deserialize::<DeserializeError>(&buffer[..len]).is_err(),
                "truncation to {} bytes must fail",
                len
            );
        }
    }

    #[test]
    fn test_record_rejects_oversized_data() {
        let record = BalanceRecord {
            address: Address::from_bytes(&[1u8; 32]),
            account_data: vec![0u8; 32],
        };
        let mut buffer = Vec::new();
        BalanceRecordSerializer::new()
            .serialize(&record, &mut buffer)
            .unwrap();
        assert!(BalanceRecordDeserializer::new(31)
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }
}
