// Copyright (c) 2025 QUILL LABS <info@quill.net>

use displaydoc::Display;
use thiserror::Error;

/// Models result
pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ModelsError {
    /// Serialization error: {0}
    SerializeError(String),
    /// Deserialization error: {0}
    DeserializeError(String),
    /// buffer error: {0}
    BufferError(String),
    /// quill_hash error: {0}
    QuillHashError(#[from] quill_hash::QuillHashError),
    /// address parse error: {0}
    AddressParseError(String),
}

impl From<quill_serialization::SerializeError> for ModelsError {
    fn from(err: quill_serialization::SerializeError) -> Self {
        ModelsError::SerializeError(err.to_string())
    }
}
