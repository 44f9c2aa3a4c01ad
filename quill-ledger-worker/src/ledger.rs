// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Main disk ledger structure implementing the `LedgerController` interface

use crate::ledger_db::LedgerDb;
use quill_ledger_exports::{LedgerConfig, LedgerController, LedgerError, LedgerSnapshot};
use quill_models::address::Address;
use quill_models::round::Round;
use tracing::info;

/// Disk ledger, wrapping the RocksDB store
pub struct FinalLedger {
    /// account table sorted by address
    sorted_ledger: LedgerDb,
}

impl std::fmt::Debug for FinalLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.sorted_ledger)
    }
}

impl FinalLedger {
    /// Initializes a new `FinalLedger` from its configuration
    pub fn new(config: &LedgerConfig) -> Self {
        FinalLedger {
            sorted_ledger: LedgerDb::new(config),
        }
    }

    /// Loads an initial set of accounts into the canonical table.
    ///
    /// Only meant for genesis and test setup; past that point canonical
    /// state only changes through `apply_staging`.
    pub fn load_initial_accounts(
        &mut self,
        accounts: &[(Address, Vec<u8>)],
    ) -> Result<(), LedgerError> {
        self.sorted_ledger.put_accounts(accounts)?;
        info!("loaded {} initial ledger accounts", accounts.len());
        Ok(())
    }
}

impl LedgerController for FinalLedger {
    fn get_account(&self, addr: &Address) -> Result<Option<Vec<u8>>, LedgerError> {
        self.sorted_ledger.get_account(addr)
    }

    fn account_round(&self) -> Result<Option<Round>, LedgerError> {
        self.sorted_ledger.account_round()
    }

    fn snapshot(&self) -> Box<dyn LedgerSnapshot + '_> {
        Box::new(self.sorted_ledger.make_snapshot())
    }

    fn reset_staging(&mut self) -> Result<(), LedgerError> {
        self.sorted_ledger.wipe_staging()
    }

    fn stage_accounts(&mut self, accounts: &[(Address, Vec<u8>)]) -> Result<(), LedgerError> {
        self.sorted_ledger.stage_accounts(accounts)
    }

    fn staged_account_count(&self) -> Result<u64, LedgerError> {
        self.sorted_ledger.staged_count()
    }

    fn apply_staging(&mut self, round: Round) -> Result<(), LedgerError> {
        self.sorted_ledger.apply_staging(round)
    }

    fn wipe_staging(&mut self) -> Result<(), LedgerError> {
        self.sorted_ledger.wipe_staging()
    }
}
