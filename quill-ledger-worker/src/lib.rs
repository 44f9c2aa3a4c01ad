// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! RocksDB-backed implementation of the account store interface defined in
//! `quill_ledger_exports`. Canonical accounts, the catch-up staging area and
//! store metadata live in separate column families of a single database so
//! that the staging promote is one atomic write batch.

mod ledger;
mod ledger_db;

pub use ledger::FinalLedger;
