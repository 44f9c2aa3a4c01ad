// Copyright (c) 2025 QUILL LABS <info@quill.net>

use crate::error::ModelsError;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use quill_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use serde::{Deserialize, Serialize};
use std::convert::TryInto;
use std::ops::Bound::Included;
use std::str::FromStr;

/// Size of the fixed-width sortable key form of a round, in bytes
pub const ROUND_KEY_SIZE: usize = 8;

/// A ledger round: the index of a block in the chain
#[derive(
    Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Round(pub u64);

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Round {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Round(s.parse::<u64>().map_err(|_| {
            ModelsError::DeserializeError(format!("invalid round: {}", s))
        })?))
    }
}

impl Round {
    /// New round from its index
    pub const fn new(round: u64) -> Self {
        Round(round)
    }

    /// Returns the minimal round
    pub const fn min() -> Self {
        Round(u64::MIN)
    }

    /// Returns the maximal round
    pub const fn max() -> Self {
        Round(u64::MAX)
    }

    /// Returns a fixed-size sortable binary key
    ///
    /// ## Example
    /// ```rust
    /// # use quill_models::round::Round;
    /// let round = Round::new(42);
    /// let key = round.to_bytes_key();
    /// assert_eq!(Round::from_bytes_key(&key), round);
    /// ```
    pub fn to_bytes_key(&self) -> [u8; ROUND_KEY_SIZE] {
        self.0.to_be_bytes()
    }

    /// Deserializes a round from its fixed-size sortable binary key form
    pub fn from_bytes_key(buffer: &[u8; ROUND_KEY_SIZE]) -> Self {
        Round(u64::from_be_bytes(*buffer))
    }
}

/// Serializer for `Round`
#[derive(Clone, Default)]
pub struct RoundSerializer {
    u64_serializer: U64VarIntSerializer,
}

impl RoundSerializer {
    /// Creates a new `RoundSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<Round> for RoundSerializer {
    fn serialize(&self, value: &Round, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `Round`
#[derive(Clone)]
pub struct RoundDeserializer {
    u64_deserializer: U64VarIntDeserializer,
}

impl RoundDeserializer {
    /// Creates a new `RoundDeserializer`
    pub const fn new() -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
        }
    }
}

impl Default for RoundDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Round> for RoundDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Round, E> {
        context("Failed round deserialization", |input| {
            self.u64_deserializer
                .deserialize(input)
                .map(|(rest, round)| (rest, Round(round)))
        })(buffer)
    }
}

/// Deserializes a round from a raw big-endian metadata key value
pub fn round_from_key_bytes(buffer: &[u8]) -> Result<Round, ModelsError> {
    Ok(Round::from_bytes_key(buffer.try_into().map_err(|_| {
        ModelsError::BufferError("invalid round key length".into())
    })?))
}
