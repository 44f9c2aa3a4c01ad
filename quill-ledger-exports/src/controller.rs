// Copyright (c) 2025 QUILL LABS <info@quill.net>

use crate::error::LedgerError;
use quill_models::address::Address;
use quill_models::round::Round;
use quill_models::streaming_step::StreamingStep;
use std::fmt::Debug;

/// A point-in-time read view of the canonical account table.
///
/// Pagination over one snapshot is deterministic and gap-free even while the
/// live store keeps advancing underneath it.
pub trait LedgerSnapshot {
    /// Get one page of accounts in ascending address order.
    ///
    /// # Arguments
    /// * `cursor`: where the page must start; `Started` reads from the first
    ///   address, `Ongoing(addr)` resumes right after `addr`
    /// * `limit`: maximum number of accounts to return
    ///
    /// # Returns
    /// The page content and the cursor to pass to the next call. The returned
    /// cursor is `Finished` when the page is the last one.
    fn fetch_page(
        &self,
        cursor: StreamingStep<Address>,
        limit: usize,
    ) -> Result<(Vec<(Address, Vec<u8>)>, StreamingStep<Address>), LedgerError>;
}

/// Interface to the account store.
///
/// Canonical state is only ever mutated by `apply_staging`, which promotes
/// the whole staging area in one atomic store transaction. Everything staged
/// before that point is invisible to canonical readers.
pub trait LedgerController: Send + Sync + Debug {
    /// Gets a copy of the account data blob of an address.
    ///
    /// # Returns
    /// The account data, or None if the account does not exist
    fn get_account(&self, addr: &Address) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Gets the round the canonical account state corresponds to.
    ///
    /// # Returns
    /// The stamped round, or None if the ledger has never been stamped
    fn account_round(&self) -> Result<Option<Round>, LedgerError>;

    /// Opens a pinned read snapshot of the canonical account table
    fn snapshot(&self) -> Box<dyn LedgerSnapshot + '_>;

    /// Empties the staging area
    fn reset_staging(&mut self) -> Result<(), LedgerError>;

    /// Appends a batch of accounts to the staging area
    fn stage_accounts(&mut self, accounts: &[(Address, Vec<u8>)]) -> Result<(), LedgerError>;

    /// Counts the accounts currently staged
    fn staged_account_count(&self) -> Result<u64, LedgerError>;

    /// Atomically replaces canonical account state with the staging area
    /// content, clears the staging area and stamps `round`.
    ///
    /// All-or-nothing: on failure canonical state is left exactly as it was.
    fn apply_staging(&mut self, round: Round) -> Result<(), LedgerError>;

    /// Discards the staging area content, canonical state untouched
    fn wipe_staging(&mut self) -> Result<(), LedgerError>;
}
