// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Catchpoint label: the compact `<round>#<digest>` fingerprint naming one
//! snapshot. Both sides of a catch-up use it to agree on which snapshot is
//! being transferred.

use crate::error::CatchpointError;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::multi::length_data;
use nom::IResult;
use quill_hash::Hash;
use quill_models::round::Round;
use quill_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use std::ops::Bound::Included;
use std::str::FromStr;

/// Longest accepted text form of a label, as a wire-level sanity bound
const MAX_LABEL_LEN: u64 = 128;

/// Round + block header digest fingerprint of one catchpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchpointLabel {
    /// round the snapshot was taken at
    pub round: Round,
    /// digest of the block header at that round
    pub digest: Hash,
}

impl CatchpointLabel {
    /// Creates a new `CatchpointLabel`
    pub const fn new(round: Round, digest: Hash) -> Self {
        CatchpointLabel { round, digest }
    }
}

impl std::fmt::Display for CatchpointLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}#{}", self.round, self.digest)
    }
}

impl FromStr for CatchpointLabel {
    type Err = CatchpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (round_str, digest_str) = s
            .split_once('#')
            .ok_or_else(|| CatchpointError::MalformedLabel(s.to_string()))?;
        let round = Round::from_str(round_str)
            .map_err(|_| CatchpointError::MalformedLabel(s.to_string()))?;
        let digest = Hash::from_bs58_check(digest_str)
            .map_err(|_| CatchpointError::MalformedLabel(s.to_string()))?;
        Ok(CatchpointLabel { round, digest })
    }
}

/// Serializer for `CatchpointLabel`: varint-prefixed UTF-8 text form
#[derive(Clone, Default)]
pub struct CatchpointLabelSerializer {
    len_serializer: U64VarIntSerializer,
}

impl CatchpointLabelSerializer {
    /// Creates a new `CatchpointLabelSerializer`
    pub const fn new() -> Self {
        Self {
            len_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<CatchpointLabel> for CatchpointLabelSerializer {
    fn serialize(&self, value: &CatchpointLabel, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let text = value.to_string();
        self.len_serializer
            .serialize(&(text.len() as u64), buffer)?;
        buffer.extend_from_slice(text.as_bytes());
        Ok(())
    }
}

/// Deserializer for `CatchpointLabel`
#[derive(Clone)]
pub struct CatchpointLabelDeserializer {
    len_deserializer: U64VarIntDeserializer,
}

impl CatchpointLabelDeserializer {
    /// Creates a new `CatchpointLabelDeserializer`
    pub const fn new() -> Self {
        Self {
            len_deserializer: U64VarIntDeserializer::new(Included(1), Included(MAX_LABEL_LEN)),
        }
    }
}

impl Default for CatchpointLabelDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<CatchpointLabel> for CatchpointLabelDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], CatchpointLabel, E> {
        context("Failed catchpoint label deserialization", |input: &'a [u8]| {
            let (rest, text_bytes) =
                length_data(|input| self.len_deserializer.deserialize(input))(input)?;
            let label = std::str::from_utf8(text_bytes)
                .ok()
                .and_then(|text| CatchpointLabel::from_str(text).ok())
                .ok_or_else(|| {
                    nom::Err::Error(E::from_error_kind(input, ErrorKind::MapRes))
                })?;
            Ok((rest, label))
        })(buffer)
    }
}
