// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Catchpoint catch-up accessor: consumes an untrusted catchpoint container
//! entry-by-entry, stages the balances into the store's staging area, and
//! promotes them into canonical state in one atomic merge once the
//! header-declared account total has been fully staged and verified.
//!
//! Entries may arrive in any order the transport delivers them; completeness
//! is confirmed purely by the header's declared total, never by entry
//! positions. Partial progress is never visible to canonical readers.

use crate::chunk::BalancesChunkDeserializer;
use crate::config::CatchpointConfig;
use crate::entry::CatchpointEntry;
use crate::error::CatchpointError;
use crate::header::{CatchpointHeader, CatchpointHeaderDeserializer};
use quill_hash::Hash;
use quill_ledger_exports::LedgerController;
use quill_models::address::Address;
use quill_models::round::Round;
use quill_serialization::{DeserializeError, Deserializer};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// State of one catch-up ingest session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchupState {
    /// no session in progress
    Idle,
    /// session started, entries are being staged
    Staging,
    /// all chunks implied by the header have been staged
    Ready,
    /// staged state has been promoted into canonical state (terminal)
    Applied,
    /// session aborted by the caller or by a verification failure (terminal)
    Aborted,
}

/// Session progress threaded through successive
/// [`CatchpointCatchupAccessor::progress_staging_balances`] calls.
///
/// Not persisted: a crash mid-ingest restarts the session from
/// [`CatchpointCatchupAccessor::reset_staging_balances`].
#[derive(Debug, Clone)]
pub struct CatchupProgress {
    /// account total declared by the header, once seen
    pub total_accounts: Option<u64>,
    /// accounts staged so far
    pub processed_accounts: u64,
    /// chunk entries staged so far
    pub processed_chunks: u64,
    /// XOR-combined digest of the staged chunk entries, for out-of-band
    /// comparison with the writer's content digest
    pub content_digest: Hash,
    /// names of the entries already consumed, for duplicate rejection
    seen_entries: HashSet<String>,
}

impl Default for CatchupProgress {
    fn default() -> Self {
        CatchupProgress {
            total_accounts: None,
            processed_accounts: 0,
            processed_chunks: 0,
            content_digest: Hash::zero(),
            seen_entries: HashSet::new(),
        }
    }
}

/// Stepped consumer of one catchpoint container.
///
/// Owns the destination ledger for the duration of the catch-up; canonical
/// state is only touched by [`Self::apply_staging_balances`], in one atomic
/// store transaction.
pub struct CatchpointCatchupAccessor<L: LedgerController> {
    ledger: L,
    state: CatchupState,
    header: Option<CatchpointHeader>,
    chunk_deserializer: BalancesChunkDeserializer,
    header_deserializer: CatchpointHeaderDeserializer,
    cancel: Arc<AtomicBool>,
}

impl<L: LedgerController> CatchpointCatchupAccessor<L> {
    /// Creates a new `CatchpointCatchupAccessor` over the destination ledger
    pub fn new(ledger: L, config: &CatchpointConfig, cancel: Arc<AtomicBool>) -> Self {
        CatchpointCatchupAccessor {
            ledger,
            state: CatchupState::Idle,
            header: None,
            chunk_deserializer: BalancesChunkDeserializer::new(
                config.balances_per_chunk,
                config.max_account_data_len,
            ),
            header_deserializer: CatchpointHeaderDeserializer::new(),
            cancel,
        }
    }

    /// Current session state
    pub fn state(&self) -> CatchupState {
        self.state
    }

    /// Read access to the destination ledger
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Consumes the accessor, returning the destination ledger
    pub fn into_ledger(self) -> L {
        self.ledger
    }

    /// Starts a fresh ingest session.
    ///
    /// With `erase_existing` the staging area is wiped first; without it the
    /// staging area is required to already be empty. Allowed from any state:
    /// restarting after an abort or a completed catch-up begins a new
    /// session.
    pub fn reset_staging_balances(&mut self, erase_existing: bool) -> Result<(), CatchpointError> {
        if erase_existing {
            self.ledger.reset_staging()?;
        } else if self.ledger.staged_account_count()? > 0 {
            return Err(CatchpointError::InvalidSession(
                "staging area is not empty".into(),
            ));
        }
        self.header = None;
        self.state = CatchupState::Staging;
        info!("catch-up staging session started");
        Ok(())
    }

    /// Ingests one container entry, in whatever order the transport
    /// delivered it.
    ///
    /// The header entry records the expected account total; a balances chunk
    /// entry is decoded and staged. Duplicate entries are rejected without
    /// affecting staged content. Decode and verification failures abort the
    /// session; store failures are propagated verbatim and the caller
    /// decides whether to restart the whole session.
    pub fn progress_staging_balances(
        &mut self,
        entry_name: &str,
        entry_bytes: &[u8],
        progress: &mut CatchupProgress,
    ) -> Result<(), CatchpointError> {
        // cancellation leaves the session as-is: staged data stays
        // discardable, the caller aborts or resumes at its own pace
        if self.cancel.load(Ordering::Relaxed) {
            return Err(CatchpointError::Cancelled);
        }
        match self.state {
            CatchupState::Staging | CatchupState::Ready => {}
            state => {
                return Err(CatchpointError::InvalidSession(format!(
                    "cannot ingest entries in state {:?}",
                    state
                )))
            }
        }
        let entry = match CatchpointEntry::from_name(entry_name) {
            Ok(entry) => entry,
            Err(err) => return Err(self.fail(err)),
        };
        if !progress.seen_entries.insert(entry_name.to_string()) {
            return Err(CatchpointError::DuplicateEntry(entry_name.to_string()));
        }

        match entry {
            CatchpointEntry::Header => self.stage_header(entry_bytes, progress)?,
            CatchpointEntry::BalancesChunk { shard, shard_count } => {
                self.stage_chunk(entry_bytes, shard, shard_count, progress)?
            }
        }

        if let Some(total) = progress.total_accounts {
            if progress.processed_accounts == total {
                self.state = CatchupState::Ready;
            }
        }
        Ok(())
    }

    /// Atomically promotes the staged balances into canonical state at
    /// `round`.
    ///
    /// Fails with `TotalMismatch` when the staged account count disagrees
    /// with the header-declared total; canonical state is untouched on every
    /// failure path.
    pub fn apply_staging_balances(&mut self, round: Round) -> Result<(), CatchpointError> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(CatchpointError::Cancelled);
        }
        let (expected, label) = match self.state {
            CatchupState::Staging | CatchupState::Ready => match &self.header {
                Some(header) => (header.total_accounts, header.catchpoint),
                None => {
                    return Err(CatchpointError::InvalidSession(
                        "catchpoint header not seen yet".into(),
                    ))
                }
            },
            state => {
                return Err(CatchpointError::InvalidSession(format!(
                    "cannot apply in state {:?}",
                    state
                )))
            }
        };
        let got = self.ledger.staged_account_count()?;
        if got != expected {
            return Err(self.fail(CatchpointError::TotalMismatch { expected, got }));
        }
        self.ledger.apply_staging(round)?;
        self.state = CatchupState::Applied;
        info!(
            "catchpoint {} applied at round {}: {} accounts promoted",
            label, round, expected
        );
        Ok(())
    }

    /// Aborts the session, discarding staged data; canonical state untouched
    pub fn abort_staging(&mut self) -> Result<(), CatchpointError> {
        if self.state == CatchupState::Applied {
            return Err(CatchpointError::InvalidSession(
                "session already applied".into(),
            ));
        }
        self.ledger.wipe_staging()?;
        self.state = CatchupState::Aborted;
        info!("catch-up staging session aborted");
        Ok(())
    }

    fn stage_header(
        &mut self,
        entry_bytes: &[u8],
        progress: &mut CatchupProgress,
    ) -> Result<(), CatchpointError> {
        let parsed = self
            .header_deserializer
            .deserialize::<DeserializeError>(entry_bytes)
            .map(|(rest, header)| (rest.is_empty(), header));
        let header = match parsed {
            Ok((true, header)) => header,
            Ok((false, _)) => {
                return Err(self.fail(CatchpointError::MalformedHeader(
                    "trailing bytes after header".into(),
                )))
            }
            Err(err) => return Err(self.fail(CatchpointError::MalformedHeader(err.to_string()))),
        };
        if progress.processed_accounts > header.total_accounts {
            return Err(self.fail(CatchpointError::TotalMismatch {
                expected: header.total_accounts,
                got: progress.processed_accounts,
            }));
        }
        debug!(
            "catchpoint header staged: label {} declaring {} accounts",
            header.catchpoint, header.total_accounts
        );
        progress.total_accounts = Some(header.total_accounts);
        self.header = Some(header);
        Ok(())
    }

    fn stage_chunk(
        &mut self,
        entry_bytes: &[u8],
        shard: u64,
        shard_count: u64,
        progress: &mut CatchupProgress,
    ) -> Result<(), CatchpointError> {
        let parsed = self
            .chunk_deserializer
            .deserialize::<DeserializeError>(entry_bytes)
            .map(|(rest, chunk)| (rest.is_empty(), chunk));
        let chunk = match parsed {
            Ok((true, chunk)) => chunk,
            Ok((false, _)) => {
                return Err(self.fail(CatchpointError::MalformedChunk(
                    "trailing bytes after chunk".into(),
                )))
            }
            Err(err) => return Err(self.fail(CatchpointError::MalformedChunk(err.to_string()))),
        };
        let accounts: Vec<(Address, Vec<u8>)> = chunk
            .balances
            .into_iter()
            .map(|record| (record.address, record.account_data))
            .collect();
        self.ledger.stage_accounts(&accounts)?;
        progress.processed_accounts += accounts.len() as u64;
        progress.processed_chunks += 1;
        progress.content_digest ^= Hash::compute_from(entry_bytes);
        if let Some(total) = progress.total_accounts {
            if progress.processed_accounts > total {
                return Err(self.fail(CatchpointError::TotalMismatch {
                    expected: total,
                    got: progress.processed_accounts,
                }));
            }
        }
        debug!(
            "catchpoint chunk {}/{} staged with {} accounts",
            shard,
            shard_count,
            accounts.len()
        );
        Ok(())
    }

    /// Unrecoverable verification failure: discard staged data and end the
    /// session, leaving canonical state untouched
    fn fail(&mut self, err: CatchpointError) -> CatchpointError {
        if let Err(wipe_err) = self.ledger.wipe_staging() {
            warn!(
                "failed to discard staging after fatal catch-up error: {}",
                wipe_err
            );
        }
        self.state = CatchupState::Aborted;
        err
    }
}
