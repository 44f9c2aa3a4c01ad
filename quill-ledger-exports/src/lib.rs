// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Account store interface consumed by the catchpoint engine: canonical
//! reads, pinned snapshot pagination, and the staging area primitives used
//! by catchpoint catch-up.

mod config;
mod controller;
mod error;

pub use config::LedgerConfig;
pub use controller::{LedgerController, LedgerSnapshot};
pub use error::LedgerError;
