// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! This file defines a configuration structure containing all settings for the catchpoint system

/// Number of balance records per catchpoint chunk
pub const BALANCES_PER_CHUNK: u64 = 512;

/// Max byte length of one account data blob inside a catchpoint
pub const MAX_ACCOUNT_DATA_LEN: u64 = 1_048_576;

/// Catchpoint configuration
#[derive(Debug, Clone)]
pub struct CatchpointConfig {
    /// capacity of one balance chunk, in records
    pub balances_per_chunk: u64,
    /// max byte length of one account data blob
    pub max_account_data_len: u64,
}

impl Default for CatchpointConfig {
    fn default() -> Self {
        CatchpointConfig {
            balances_per_chunk: BALANCES_PER_CHUNK,
            max_account_data_len: MAX_ACCOUNT_DATA_LEN,
        }
    }
}
