// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Base model types shared across the node: account addresses, rounds,
//! streaming cursors and the common serialization helpers.

/// Account address
pub mod address;
/// Model error types
pub mod error;
/// Ledger round
pub mod round;
/// Serialization helpers for collections
pub mod serialization;
/// Resumable streaming cursor
pub mod streaming_step;
