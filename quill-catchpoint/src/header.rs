// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Catchpoint header: the metadata entry describing a whole snapshot. Its
//! declared account total is the completeness criterion the catch-up side
//! verifies before promoting staged state.

use crate::label::{CatchpointLabel, CatchpointLabelDeserializer, CatchpointLabelSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use quill_hash::{Hash, HashDeserializer, HashSerializer};
use quill_models::round::{Round, RoundDeserializer, RoundSerializer};
use quill_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use std::ops::Bound::Included;

/// Metadata describing one whole catchpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchpointHeader {
    /// label naming this catchpoint
    pub catchpoint: CatchpointLabel,
    /// round the snapshot was taken at
    pub blocks_round: Round,
    /// digest of the block header at that round
    pub block_header_digest: Hash,
    /// total account count across all balance chunks of the container
    pub total_accounts: u64,
}

/// Serializer for `CatchpointHeader`
#[derive(Clone, Default)]
pub struct CatchpointHeaderSerializer {
    label_serializer: CatchpointLabelSerializer,
    round_serializer: RoundSerializer,
    hash_serializer: HashSerializer,
    u64_serializer: U64VarIntSerializer,
}

impl CatchpointHeaderSerializer {
    /// Creates a new `CatchpointHeaderSerializer`
    pub const fn new() -> Self {
        Self {
            label_serializer: CatchpointLabelSerializer::new(),
            round_serializer: RoundSerializer::new(),
            hash_serializer: HashSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<CatchpointHeader> for CatchpointHeaderSerializer {
    fn serialize(
        &self,
        value: &CatchpointHeader,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.label_serializer.serialize(&value.catchpoint, buffer)?;
        self.round_serializer.serialize(&value.blocks_round, buffer)?;
        self.hash_serializer
            .serialize(&value.block_header_digest, buffer)?;
        self.u64_serializer.serialize(&value.total_accounts, buffer)
    }
}

/// Deserializer for `CatchpointHeader`
#[derive(Clone)]
pub struct CatchpointHeaderDeserializer {
    label_deserializer: CatchpointLabelDeserializer,
    round_deserializer: RoundDeserializer,
    hash_deserializer: HashDeserializer,
    u64_deserializer: U64VarIntDeserializer,
}

impl CatchpointHeaderDeserializer {
    /// Creates a new `CatchpointHeaderDeserializer`
    pub const fn new() -> Self {
        Self {
            label_deserializer: CatchpointLabelDeserializer::new(),
            round_deserializer: RoundDeserializer::new(),
            hash_deserializer: HashDeserializer::new(),
            u64_deserializer: U64VarIntDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
        }
    }
}

impl Default for CatchpointHeaderDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<CatchpointHeader> for CatchpointHeaderDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], CatchpointHeader, E> {
        context("Failed catchpoint header deserialization", |input| {
            tuple((
                context("Failed label deserialization", |input| {
                    self.label_deserializer.deserialize(input)
                }),
                context("Failed round deserialization", |input| {
                    self.round_deserializer.deserialize(input)
                }),
                context("Failed digest deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed account total deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
            ))
            .map(
                |(catchpoint, blocks_round, block_header_digest, total_accounts)| {
                    CatchpointHeader {
                        catchpoint,
                        blocks_round,
                        block_header_digest,
                        total_accounts,
                    }
                },
            )
            .parse(input)
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_serialization::DeserializeError;

    fn make_header() -> CatchpointHeader {
        let round = Round::new(12345);
        let digest = Hash::compute_from(&[1, 2, 3]);
        CatchpointHeader {
            catchpoint: CatchpointLabel::new(round, digest),
            blocks_round: round,
            block_header_digest: digest,
            total_accounts: 300,
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = make_header();
        let mut buffer = Vec::new();
        CatchpointHeaderSerializer::new()
            .serialize(&header, &mut buffer)
            .unwrap();
        let (rest, out) = CatchpointHeaderDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, header);
    }

    #[test]
    fn test_header_rejects_truncated_input() {
        let header = make_header();
        let mut buffer = Vec::new();
        CatchpointHeaderSerializer::new()
            .serialize(&header, &mut buffer)
            .unwrap();
        let deser = CatchpointHeaderDeserializer::new();
        assert!(deser
            .deserialize::<DeserializeError>(&buffer[..buffer.len() - 1])
            .is_err());
        assert!(deser.deserialize::<DeserializeError>(&[]).is_err());
    }
}
