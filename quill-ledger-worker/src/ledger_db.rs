// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Module to interact with the disk ledger

use quill_ledger_exports::{LedgerConfig, LedgerError, LedgerSnapshot};
use quill_models::address::Address;
use quill_models::round::{round_from_key_bytes, Round};
use quill_models::streaming_step::StreamingStep;
use rocksdb::{
    ColumnFamilyDescriptor, Direction, IteratorMode, Options, ReadOptions, WriteBatch, DB,
};
use std::convert::TryInto;
use std::fmt::Debug;
use tracing::debug;

const ACCOUNTS_CF: &str = "accounts";
const STAGING_CF: &str = "staging";
const METADATA_CF: &str = "metadata";
const OPEN_ERROR: &str = "critical: rocksdb open operation failed";
const CF_ERROR: &str = "critical: rocksdb column family operation failed";
const KEY_DESER_ERROR: &str = "critical: stored account key is corrupted";
const ROUND_KEY: &[u8; 1] = b"r";

/// Disk ledger DB module
///
/// Contains a `RocksDB` DB instance
pub(crate) struct LedgerDb {
    db: DB,
    max_account_data_len: u64,
}

impl Debug for LedgerDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#?}", self.db)
    }
}

impl LedgerDb {
    /// Create and initialize a new `LedgerDb`
    pub fn new(config: &LedgerConfig) -> Self {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let db = DB::open_cf_descriptors(
            &db_opts,
            &config.disk_ledger_path,
            vec![
                ColumnFamilyDescriptor::new(ACCOUNTS_CF, Options::default()),
                ColumnFamilyDescriptor::new(STAGING_CF, Options::default()),
                ColumnFamilyDescriptor::new(METADATA_CF, Options::default()),
            ],
        )
        .expect(OPEN_ERROR);

        LedgerDb {
            db,
            max_account_data_len: config.max_account_data_len,
        }
    }

    /// Get the account data blob of an address from the canonical table
    pub fn get_account(&self, addr: &Address) -> Result<Option<Vec<u8>>, LedgerError> {
        let handle = self.db.cf_handle(ACCOUNTS_CF).expect(CF_ERROR);
        self.db
            .get_cf(handle, addr.as_bytes())
            .map_err(|err| LedgerError::DbError(err.to_string()))
    }

    /// Get the round stamped on the canonical state, if any
    pub fn account_round(&self) -> Result<Option<Round>, LedgerError> {
        let handle = self.db.cf_handle(METADATA_CF).expect(CF_ERROR);
        self.db
            .get_cf(handle, ROUND_KEY)
            .map_err(|err| LedgerError::DbError(err.to_string()))?
            .map(|bytes| round_from_key_bytes(&bytes).map_err(LedgerError::ModelsError))
            .transpose()
    }

    /// Write a batch of accounts directly into the canonical table.
    ///
    /// Only used when loading an initial ledger; regular canonical mutation
    /// goes through `apply_staging`.
    pub fn put_accounts(&self, accounts: &[(Address, Vec<u8>)]) -> Result<(), LedgerError> {
        let handle = self.db.cf_handle(ACCOUNTS_CF).expect(CF_ERROR);
        let mut batch = WriteBatch::default();
        for (addr, data) in accounts {
            batch.put_cf(handle, addr.as_bytes(), data);
        }
        self.db
            .write(batch)
            .map_err(|err| LedgerError::DbError(err.to_string()))
    }

    /// Open a pinned point-in-time read view of the canonical table
    pub fn make_snapshot(&self) -> LedgerDbSnapshot<'_> {
        LedgerDbSnapshot {
            db: &self.db,
            snapshot: self.db.snapshot(),
        }
    }

    /// Append a batch of accounts to the staging area
    pub fn stage_accounts(&self, accounts: &[(Address, Vec<u8>)]) -> Result<(), LedgerError> {
        let handle = self.db.cf_handle(STAGING_CF).expect(CF_ERROR);
        let mut batch = WriteBatch::default();
        for (addr, data) in accounts {
            if data.len() as u64 > self.max_account_data_len {
                return Err(LedgerError::StagingError(format!(
                    "account data for {} exceeds {} bytes",
                    addr, self.max_account_data_len
                )));
            }
            batch.put_cf(handle, addr.as_bytes(), data);
        }
        self.db
            .write(batch)
            .map_err(|err| LedgerError::DbError(err.to_string()))
    }

    /// Count the rows currently in the staging area
    pub fn staged_count(&self) -> Result<u64, LedgerError> {
        let handle = self.db.cf_handle(STAGING_CF).expect(CF_ERROR);
        Ok(self
            .db
            .iterator_cf(handle, IteratorMode::Start)
            .flatten()
            .count() as u64)
    }

    /// Atomically replace the canonical table with the staging area content.
    ///
    /// Canonical deletions, staged insertions, staging cleanup and the round
    /// stamp all go through one `WriteBatch`, so concurrent canonical readers
    /// observe either the fully-old or the fully-new state.
    pub fn apply_staging(&self, round: Round) -> Result<(), LedgerError> {
        let accounts_handle = self.db.cf_handle(ACCOUNTS_CF).expect(CF_ERROR);
        let staging_handle = self.db.cf_handle(STAGING_CF).expect(CF_ERROR);
        let metadata_handle = self.db.cf_handle(METADATA_CF).expect(CF_ERROR);

        let mut batch = WriteBatch::default();
        for (key, _) in self
            .db
            .iterator_cf(accounts_handle, IteratorMode::Start)
            .flatten()
        {
            batch.delete_cf(accounts_handle, key);
        }
        let mut staged = 0u64;
        for (key, value) in self
            .db
            .iterator_cf(staging_handle, IteratorMode::Start)
            .flatten()
        {
            batch.put_cf(accounts_handle, &key, value);
            batch.delete_cf(staging_handle, key);
            staged += 1;
        }
        batch.put_cf(metadata_handle, ROUND_KEY, round.to_bytes_key());
        self.db
            .write(batch)
            .map_err(|err| LedgerError::DbError(err.to_string()))?;
        debug!("promoted {} staged accounts at round {}", staged, round);
        Ok(())
    }

    /// Drop the staging area content
    pub fn wipe_staging(&mut self) -> Result<(), LedgerError> {
        self.db
            .drop_cf(STAGING_CF)
            .map_err(|err| LedgerError::DbError(err.to_string()))?;
        self.db
            .create_cf(STAGING_CF, &Options::default())
            .map_err(|err| LedgerError::DbError(err.to_string()))
    }
}

// test helpers
impl LedgerDb {
    /// Get every canonical address and its account data.
    ///
    /// IMPORTANT: This should only be used for debug and test purposes.
    #[cfg(test)]
    pub fn get_every_account(&self) -> std::collections::BTreeMap<Address, Vec<u8>> {
        let handle = self.db.cf_handle(ACCOUNTS_CF).expect(CF_ERROR);
        self.db
            .iterator_cf(handle, IteratorMode::Start)
            .flatten()
            .map(|(key, value)| {
                (
                    Address::from_bytes(key[..].try_into().expect(KEY_DESER_ERROR)),
                    value.to_vec(),
                )
            })
            .collect()
    }
}

/// Pinned point-in-time read view over the canonical account table
pub(crate) struct LedgerDbSnapshot<'a> {
    db: &'a DB,
    snapshot: rocksdb::Snapshot<'a>,
}

impl LedgerSnapshot for LedgerDbSnapshot<'_> {
    fn fetch_page(
        &self,
        cursor: StreamingStep<Address>,
        limit: usize,
    ) -> Result<(Vec<(Address, Vec<u8>)>, StreamingStep<Address>), LedgerError> {
        let handle = self.db.cf_handle(ACCOUNTS_CF).expect(CF_ERROR);
        let mut read_opts = ReadOptions::default();
        read_opts.set_snapshot(&self.snapshot);

        // Start the iterator at the next element after the cursor if defined,
        // otherwise at the first key of the canonical table.
        let db_iterator = match cursor {
            StreamingStep::Started => {
                self.db
                    .iterator_cf_opt(handle, read_opts, IteratorMode::Start)
            }
            StreamingStep::Ongoing(last_addr) => {
                let mut iter = self.db.iterator_cf_opt(
                    handle,
                    read_opts,
                    IteratorMode::From(last_addr.as_bytes(), Direction::Forward),
                );
                iter.next();
                iter
            }
            StreamingStep::Finished => return Ok((Vec::new(), StreamingStep::Finished)),
        };

        let mut page = Vec::with_capacity(limit);
        for (key, value) in db_iterator.flatten() {
            if page.len() >= limit {
                break;
            }
            let addr = Address::from_bytes(key[..].try_into().expect(KEY_DESER_ERROR));
            page.push((addr, value.to_vec()));
        }
        let new_cursor = if page.len() < limit {
            StreamingStep::Finished
        } else {
            // unwrap cannot fail: limit > 0 implies a non-empty page here
            StreamingStep::Ongoing(page.last().unwrap().0)
        };
        Ok((page, new_cursor))
    }
}
