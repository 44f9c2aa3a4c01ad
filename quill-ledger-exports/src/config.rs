// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! This file defines a configuration structure containing all settings for the ledger system

use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// disk ledger db directory
    pub disk_ledger_path: PathBuf,
    /// max byte length of one account data blob
    pub max_account_data_len: u64,
}
