// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Container entry naming. Entry names are the only dispatch key of the
//! container format: transports may deliver entries in any order, so both
//! sides decode the name into a closed variant here, at the boundary.

use crate::error::CatchpointError;

/// Name of the catchpoint header entry
pub const CONTENT_ENTRY_NAME: &str = "content.msgpack";

const BALANCES_PREFIX: &str = "balances.";
const ENTRY_SUFFIX: &str = ".msgpack";

/// One entry of a catchpoint container, decoded from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchpointEntry {
    /// the catchpoint header (`content.msgpack`)
    Header,
    /// one balances chunk (`balances.<shard>.<shard_count>.msgpack`)
    BalancesChunk {
        /// shard number, monotonic from 1
        shard: u64,
        /// total shard dimension announced by the writer
        shard_count: u64,
    },
}

impl CatchpointEntry {
    /// Decodes a container entry name.
    ///
    /// Accepts any `<shard>.<shard_count>` pair with both numbers >= 1;
    /// everything else fails with `UnrecognizedEntry`.
    pub fn from_name(name: &str) -> Result<Self, CatchpointError> {
        if name == CONTENT_ENTRY_NAME {
            return Ok(CatchpointEntry::Header);
        }
        let unrecognized = || CatchpointError::UnrecognizedEntry(name.to_string());
        let numbers = name
            .strip_prefix(BALANCES_PREFIX)
            .and_then(|rest| rest.strip_suffix(ENTRY_SUFFIX))
            .ok_or_else(unrecognized)?;
        let (shard_str, shard_count_str) = numbers.split_once('.').ok_or_else(unrecognized)?;
        let shard = shard_str.parse::<u64>().map_err(|_| unrecognized())?;
        let shard_count = shard_count_str.parse::<u64>().map_err(|_| unrecognized())?;
        if shard == 0 || shard_count == 0 {
            return Err(unrecognized());
        }
        Ok(CatchpointEntry::BalancesChunk { shard, shard_count })
    }

    /// Formats the name of a balances chunk entry
    pub fn balances_name(shard: u64, shard_count: u64) -> String {
        format!(
            "{}{}.{}{}",
            BALANCES_PREFIX, shard, shard_count, ENTRY_SUFFIX
        )
    }
}
