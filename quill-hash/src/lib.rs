// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! BLAKE3 content hash used across the node for content digests and
//! block header fingerprints.

mod error;
mod hash;

pub use error::QuillHashError;
pub use hash::{Hash, HashDeserializer, HashSerializer};

/// Size of a hash in bytes
pub const HASH_SIZE_BYTES: usize = 32;
