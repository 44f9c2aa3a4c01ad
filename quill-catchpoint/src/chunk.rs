// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! A bounded-size ordered group of balance records, the unit of transfer and
//! storage inside a catchpoint container.

use crate::record::{BalanceRecord, BalanceRecordDeserializer, BalanceRecordSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::multi::length_count;
use nom::{IResult, Parser};
use quill_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use std::ops::Bound::Included;

/// An ordered group of balance records.
///
/// Records ascend by address; every chunk of a catchpoint except possibly
/// the last one is exactly at the configured capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BalancesChunk {
    /// balance records, in ascending address order
    pub balances: Vec<BalanceRecord>,
}

/// Serializer for `BalancesChunk`
#[derive(Clone, Default)]
pub struct BalancesChunkSerializer {
    count_serializer: U64VarIntSerializer,
    record_serializer: BalanceRecordSerializer,
}

impl BalancesChunkSerializer {
    /// Creates a new `BalancesChunkSerializer`
    pub const fn new() -> Self {
        Self {
            count_serializer: U64VarIntSerializer::new(),
            record_serializer: BalanceRecordSerializer::new(),
        }
    }
}

impl Serializer<BalancesChunk> for BalancesChunkSerializer {
    fn serialize(&self, value: &BalancesChunk, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.count_serializer
            .serialize(&(value.balances.len() as u64), buffer)?;
        for record in &value.balances {
            self.record_serializer.serialize(record, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `BalancesChunk`, hardened against untrusted input.
///
/// Rejects chunks whose declared record count is zero or exceeds the
/// configured capacity, and chunks whose byte content does not hold exactly
/// the declared records.
#[derive(Clone)]
pub struct BalancesChunkDeserializer {
    count_deserializer: U64VarIntDeserializer,
    record_deserializer: BalanceRecordDeserializer,
}

impl BalancesChunkDeserializer {
    /// Creates a new `BalancesChunkDeserializer`
    pub const fn new(balances_per_chunk: u64, max_account_data_len: u64) -> Self {
        Self {
            count_deserializer: U64VarIntDeserializer::new(
                Included(1),
                Included(balances_per_chunk),
            ),
            record_deserializer: BalanceRecordDeserializer::new(max_account_data_len),
        }
    }
}

impl Deserializer<BalancesChunk> for BalancesChunkDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BalancesChunk, E> {
        context("Failed balances chunk deserialization", |input| {
            length_count(
                context("Failed record count deserialization", |input| {
                    self.count_deserializer.deserialize(input)
                }),
                context("Failed record deserialization", |input| {
                    self.record_deserializer.deserialize(input)
                }),
            )
            .map(|balances| BalancesChunk { balances })
            .parse(input)
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_models::address::Address;
    use quill_serialization::DeserializeError;

    fn make_chunk(record_count: u8) -> BalancesChunk {
        BalancesChunk {
            balances: (0..record_count)
                .map(|i| BalanceRecord {
                    address: Address::from_bytes(&[i; 32]),
                    account_data: vec![i; (i % 7) as usize],
                })
                .collect(),
        }
    }

    fn encode(chunk: &BalancesChunk) -> Vec<u8> {
        let mut buffer = Vec::new();
        BalancesChunkSerializer::new()
            .serialize(chunk, &mut buffer)
            .unwrap();
        buffer
    }

    #[test]
    fn test_chunk_roundtrip_preserves_order() {
        let chunk = make_chunk(17);
        let buffer = encode(&chunk);
        let (rest, out) = BalancesChunkDeserializer::new(512, 1024)
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, chunk);
    }

    #[test]
    fn test_chunk_rejects_empty() {
        let buffer = encode(&BalancesChunk::default());
        assert!(BalancesChunkDeserializer::new(512, 1024)
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn test_chunk_rejects_count_over_capacity() {
        let chunk = make_chunk(9);
        let buffer = encode(&chunk);
        assert!(BalancesChunkDeserializer::new(8, 1024)
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn test_chunk_rejects_missing_records() {
        let chunk = make_chunk(4);
        let mut buffer = encode(&chunk);
        // remove the last record's bytes: the declared count now lies
        buffer.truncate(buffer.len() - 32 - 1 - chunk.balances[3].account_data.len());
        assert!(BalancesChunkDeserializer::new(512, 1024)
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn test_chunk_rejects_corrupt_embedded_record() {
        let chunk = make_chunk(4);
        let mut buffer = encode(&chunk);
        // corrupt the length prefix of the last record's data blob so it
        // claims more bytes than remain in the buffer
        let tail_data_len = chunk.balances[3].account_data.len();
        let len_prefix_pos = buffer.len() - tail_data_len - 1;
        buffer[len_prefix_pos] = 0x7F;
        assert!(BalancesChunkDeserializer::new(512, 1024)
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }
}
