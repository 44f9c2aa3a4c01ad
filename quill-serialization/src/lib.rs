// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Binary serialization framework used by every wire and storage format of
//! the node. Each encodable type gets a `Serializer` and a `Deserializer`
//! implementation pair; deserializers are nom parsers so that they compose,
//! never read out of bounds and report the failing context on bad input.

use displaydoc::Display;
use nom::error::{ContextError, ErrorKind, ParseError};
use nom::IResult;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// String {0} is too big to be serialized
    StringTooBig(String),
    /// General error {0}
    GeneralError(String),
}

/// Trait for serializing a value of type `T` into a byte buffer
pub trait Serializer<T> {
    /// Serialize `value` by appending its byte form to `buffer`
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Trait for deserializing a value of type `T` from a byte buffer.
///
/// Returns the unconsumed part of the buffer along with the value, so that
/// deserializers can be chained on a single input slice.
pub trait Deserializer<T> {
    /// Deserialize one `T` from the start of `buffer`
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Error type collecting the nom contexts traversed before a parser failed.
///
/// Use as the error parameter of [`Deserializer::deserialize`] whenever the
/// failure will be reported instead of backtracked over:
/// `deserializer.deserialize::<DeserializeError>(buffer)`.
#[derive(Debug)]
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], ErrorKind)>,
    contexts: Vec<&'static str>,
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        DeserializeError {
            errors: vec![(input, kind)],
            contexts: Vec::new(),
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, kind));
        other
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(_input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.contexts.push(ctx);
        other
    }
}

impl<'a> fmt::Display for DeserializeError<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // outermost context last in the vec, print it first
        for ctx in self.contexts.iter().rev() {
            write!(f, "{} / ", ctx)?;
        }
        if let Some((input, kind)) = self.errors.first() {
            write!(
                f,
                "{:?} error on {} remaining bytes",
                kind,
                input.len()
            )?;
        }
        Ok(())
    }
}

macro_rules! gen_varint {
    ($($type:ident, $ser:ident, $deser:ident, $buf_func:ident, $what:expr);*) => {$(
        #[doc = " Serializer for "]
        #[doc = $what]
        #[doc = " in variable-length integer form"]
        #[derive(Clone, Default)]
        pub struct $ser;

        impl $ser {
            #[doc = " Creates a new `"]
            #[doc = stringify!($ser)]
            #[doc = "`"]
            pub const fn new() -> Self {
                Self
            }
        }

        impl Serializer<$type> for $ser {
            #[doc = " ```"]
            #[doc = concat!(" use quill_serialization::{Serializer, ", stringify!($ser), "};")]
            #[doc = ""]
            #[doc = " let mut buffer = Vec::new();"]
            #[doc = concat!(" ", stringify!($ser), "::new().serialize(&300", stringify!($type), ", &mut buffer).unwrap();")]
            #[doc = " assert_eq!(buffer, vec![0b10101100, 0b00000010]);"]
            #[doc = " ```"]
            fn serialize(&self, value: &$type, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                let mut tmp = unsigned_varint::encode::$buf_func();
                buffer.extend_from_slice(unsigned_varint::encode::$type(*value, &mut tmp));
                Ok(())
            }
        }

        #[doc = " Deserializer for "]
        #[doc = $what]
        #[doc = " in variable-length integer form, bounds-checked"]
        #[derive(Clone)]
        pub struct $deser {
            range: (Bound<$type>, Bound<$type>),
        }

        impl $deser {
            #[doc = " Creates a new `"]
            #[doc = stringify!($deser)]
            #[doc = "` accepting only values within the given bounds"]
            pub const fn new(min: Bound<$type>, max: Bound<$type>) -> Self {
                Self { range: (min, max) }
            }
        }

        impl Deserializer<$type> for $deser {
            #[doc = " ```"]
            #[doc = concat!(" use quill_serialization::{Deserializer, DeserializeError, ", stringify!($deser), "};")]
            #[doc = " use std::ops::Bound::Included;"]
            #[doc = ""]
            #[doc = concat!(" let deser = ", stringify!($deser), "::new(Included(", stringify!($type), "::MIN), Included(", stringify!($type), "::MAX));")]
            #[doc = " let (rest, value) = deser.deserialize::<DeserializeError>(&[0b10101100, 0b00000010, 7]).unwrap();"]
            #[doc = " assert_eq!(value, 300);"]
            #[doc = " assert_eq!(rest, &[7]);"]
            #[doc = " ```"]
            fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                &self,
                buffer: &'a [u8],
            ) -> IResult<&'a [u8], $type, E> {
                nom::error::context(concat!("Failed ", $what, " deserialization"), |input: &'a [u8]| {
                    let (value, rest) = unsigned_varint::decode::$type(input).map_err(|_| {
                        nom::Err::Error(E::from_error_kind(input, ErrorKind::Eof))
                    })?;
                    if !self.range.contains(&value) {
                        return Err(nom::Err::Error(E::from_error_kind(
                            input,
                            ErrorKind::Verify,
                        )));
                    }
                    Ok((rest, value))
                })(buffer)
            }
        }
    )*};
}

gen_varint! {
    u32, U32VarIntSerializer, U32VarIntDeserializer, u32_buffer, "u32";
    u64, U64VarIntSerializer, U64VarIntDeserializer, u64_buffer, "u64"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Bound::{Excluded, Included};

    fn roundtrip_u64(value: u64) -> u64 {
        let mut buffer = Vec::new();
        U64VarIntSerializer::new()
            .serialize(&value, &mut buffer)
            .unwrap();
        let (rest, out) = U64VarIntDeserializer::new(Included(u64::MIN), Included(u64::MAX))
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        out
    }

    #[test]
    fn test_varint_roundtrip() {
        for value in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            assert_eq!(roundtrip_u64(value), value);
        }
    }

    #[test]
    fn test_varint_bounds_rejected() {
        let mut buffer = Vec::new();
        U64VarIntSerializer::new()
            .serialize(&512u64, &mut buffer)
            .unwrap();
        let deser = U64VarIntDeserializer::new(Included(0), Excluded(512));
        assert!(deser.deserialize::<DeserializeError>(&buffer).is_err());
    }

    #[test]
    fn test_varint_truncated_input() {
        // continuation bit set but nothing follows
        let deser = U64VarIntDeserializer::new(Included(u64::MIN), Included(u64::MAX));
        assert!(deser.deserialize::<DeserializeError>(&[0b10000000]).is_err());
        assert!(deser.deserialize::<DeserializeError>(&[]).is_err());
    }
}
