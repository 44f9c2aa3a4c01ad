// Copyright (c) 2025 QUILL LABS <info@quill.net>

use displaydoc::Display;
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum QuillHashError {
    /// Parsing error: {0}
    ParsingError(String),
}
