// Copyright (c) 2025 QUILL LABS <info@quill.net>

use displaydoc::Display;
use quill_ledger_exports::LedgerError;
use quill_models::error::ModelsError;
use quill_serialization::SerializeError;
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum CatchpointError {
    /// malformed balance record: {0}
    MalformedRecord(String),
    /// malformed balances chunk: {0}
    MalformedChunk(String),
    /// malformed catchpoint header: {0}
    MalformedHeader(String),
    /// malformed catchpoint label: {0}
    MalformedLabel(String),
    /// unrecognized container entry: {0}
    UnrecognizedEntry(String),
    /// duplicate container entry: {0}
    DuplicateEntry(String),
    /// staged account total {got} does not match the declared total {expected}
    TotalMismatch {
        /// total declared by the catchpoint header
        expected: u64,
        /// total actually staged
        got: u64,
    },
    /// invalid catch-up session state: {0}
    InvalidSession(String),
    /// ledger error: {0}
    LedgerError(#[from] LedgerError),
    /// io error: {0}
    IoError(#[from] std::io::Error),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /// serialization error: {0}
    SerializeError(#[from] SerializeError),
    /// operation cancelled
    Cancelled,
}
