// Copyright (c) 2025 QUILL LABS <info@quill.net>

use crate::config::CatchpointConfig;
use crate::label::CatchpointLabel;
use crate::writer::CatchpointWriter;
use flate2::read::GzDecoder;
use quill_hash::Hash;
use quill_ledger_exports::{LedgerConfig, LedgerController};
use quill_ledger_worker::FinalLedger;
use quill_models::address::Address;
use quill_models::round::Round;
use rand::Rng;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

/// generates a small random number of bytes
pub fn get_some_random_bytes(max_len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0usize..rng.gen_range(1..max_len))
        .map(|_| rand::random::<u8>())
        .collect()
}

/// generates a random account address
pub fn get_random_address() -> Address {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    Address::from_bytes(&bytes)
}

/// generates `count` distinct random accounts with random data blobs
pub fn get_random_accounts(count: usize) -> BTreeMap<Address, Vec<u8>> {
    let mut accounts = BTreeMap::new();
    while accounts.len() < count {
        accounts.insert(get_random_address(), get_some_random_bytes(64));
    }
    accounts
}

/// builds a disk ledger over a temp directory, seeded with `accounts`
pub fn make_test_ledger(accounts: &BTreeMap<Address, Vec<u8>>) -> (FinalLedger, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut ledger = FinalLedger::new(&LedgerConfig {
        disk_ledger_path: temp_dir.path().to_path_buf(),
        max_account_data_len: 1_000_000,
    });
    let pairs: Vec<(Address, Vec<u8>)> = accounts
        .iter()
        .map(|(addr, data)| (*addr, data.clone()))
        .collect();
    ledger.load_initial_accounts(&pairs).unwrap();
    (ledger, temp_dir)
}

/// drives a writer to completion over a pinned snapshot of `ledger`
///
/// # Returns
/// The embedded label, the writer's content digest and its account total
pub fn write_catchpoint(
    ledger: &FinalLedger,
    path: &Path,
    round: Round,
    config: &CatchpointConfig,
) -> (CatchpointLabel, Hash, u64) {
    let block_header_digest = Hash::compute_from(&round.to_bytes_key());
    let label = CatchpointLabel::new(round, block_header_digest);
    let mut writer = CatchpointWriter::new(
        path,
        ledger.snapshot(),
        round,
        block_header_digest,
        label,
        config.clone(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    loop {
        if !writer.write_step().unwrap() {
            break;
        }
    }
    (label, writer.content_digest(), writer.total_accounts())
}

/// reads back every named entry of a catchpoint container file
pub fn read_container_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file_content = std::fs::read(path).unwrap();
    let mut decoder = GzDecoder::new(&file_content[..]);
    let mut tar_data = Vec::new();
    decoder.read_to_end(&mut tar_data).unwrap();

    let mut archive = tar::Archive::new(&tar_data[..]);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (name, data)
        })
        .collect()
}
