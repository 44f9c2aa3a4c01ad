// Copyright (c) 2025 QUILL LABS <info@quill.net>

use displaydoc::Display;
use quill_models::error::ModelsError;
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum LedgerError {
    /// rocksdb error: {0}
    DbError(String),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /// staging area error: {0}
    StagingError(String),
}
