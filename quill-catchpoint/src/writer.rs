// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Catchpoint writer: drives a paginated read of the whole account table at
//! a fixed round and packs it into a gzip-compressed tar container, one
//! bounded step at a time. The caller owns the stepping loop, so it can
//! interleave cancellation checks, rate limiting or I/O deadlines between
//! steps instead of blocking on the full snapshot.

use crate::chunk::{BalancesChunk, BalancesChunkSerializer};
use crate::config::CatchpointConfig;
use crate::entry::{CatchpointEntry, CONTENT_ENTRY_NAME};
use crate::error::CatchpointError;
use crate::header::{CatchpointHeader, CatchpointHeaderSerializer};
use crate::label::CatchpointLabel;
use crate::record::BalanceRecord;
use quill_serialization::Serializer;
use flate2::write::GzEncoder;
use flate2::Compression;
use quill_hash::Hash;
use quill_ledger_exports::LedgerSnapshot;
use quill_models::address::Address;
use quill_models::round::Round;
use quill_models::streaming_step::StreamingStep;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

type TarSink = tar::Builder<GzEncoder<BufWriter<File>>>;

/// Stepped producer of one catchpoint container.
///
/// Reads from a pinned snapshot of the account store, so the emitted chunk
/// partitioning only depends on the store state at construction time. The
/// header entry is written last, with the final observed account total;
/// readers key off entry names, never entry positions.
pub struct CatchpointWriter<'a> {
    /// `None` once the container has been finalized
    tar_builder: Option<TarSink>,
    snapshot: Box<dyn LedgerSnapshot + 'a>,
    cursor: StreamingStep<Address>,
    round: Round,
    block_header_digest: Hash,
    label: CatchpointLabel,
    config: CatchpointConfig,
    chunk_serializer: BalancesChunkSerializer,
    header_serializer: CatchpointHeaderSerializer,
    total_accounts: u64,
    chunk_count: u64,
    content_digest: Hash,
    cancel: Arc<AtomicBool>,
}

impl<'a> CatchpointWriter<'a> {
    /// Creates a new `CatchpointWriter` targeting the file at `path`.
    ///
    /// A partial output file left behind by an aborted write is the caller's
    /// responsibility to discard.
    pub fn new(
        path: &Path,
        snapshot: Box<dyn LedgerSnapshot + 'a>,
        round: Round,
        block_header_digest: Hash,
        label: CatchpointLabel,
        config: CatchpointConfig,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, CatchpointError> {
        let file = File::create(path)?;
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        Ok(CatchpointWriter {
            tar_builder: Some(tar::Builder::new(encoder)),
            snapshot,
            cursor: StreamingStep::Started,
            round,
            block_header_digest,
            label,
            config,
            chunk_serializer: BalancesChunkSerializer::new(),
            header_serializer: CatchpointHeaderSerializer::new(),
            total_accounts: 0,
            chunk_count: 0,
            content_digest: Hash::zero(),
            cancel,
        })
    }

    /// Performs one bounded unit of work: read up to one chunk's worth of
    /// accounts and append it to the container.
    ///
    /// # Returns
    /// `true` while more chunks remain, `false` once the container has been
    /// finalized. Calling again after finalization is a no-op returning
    /// `false`.
    pub fn write_step(&mut self) -> Result<bool, CatchpointError> {
        if self.tar_builder.is_none() {
            return Ok(false);
        }
        if self.cancel.load(Ordering::Relaxed) {
            return Err(CatchpointError::Cancelled);
        }

        let limit = self.config.balances_per_chunk as usize;
        let (page, new_cursor) = self.snapshot.fetch_page(self.cursor, limit)?;
        self.cursor = new_cursor;
        if page.is_empty() {
            self.finalize()?;
            return Ok(false);
        }

        let chunk = BalancesChunk {
            balances: page
                .into_iter()
                .map(|(address, account_data)| BalanceRecord {
                    address,
                    account_data,
                })
                .collect(),
        };
        let mut chunk_bytes = Vec::new();
        self.chunk_serializer.serialize(&chunk, &mut chunk_bytes)?;
        self.total_accounts += chunk.balances.len() as u64;
        self.chunk_count += 1;
        self.content_digest ^= Hash::compute_from(&chunk_bytes);
        let name = CatchpointEntry::balances_name(self.chunk_count, 1);
        if let Some(builder) = self.tar_builder.as_mut() {
            append_entry(builder, &name, &chunk_bytes)?;
        }
        debug!(
            "catchpoint chunk {} written with {} accounts",
            name,
            chunk.balances.len()
        );

        if self.cursor.finished() {
            self.finalize()?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Account total observed so far; final once `write_step` returned `false`
    pub fn total_accounts(&self) -> u64 {
        self.total_accounts
    }

    /// XOR-combined digest of the emitted chunk entries; final once
    /// `write_step` returned `false`
    pub fn content_digest(&self) -> Hash {
        self.content_digest
    }

    /// Write the header entry with the final account total, then close the
    /// archive and flush the compressed stream.
    fn finalize(&mut self) -> Result<(), CatchpointError> {
        let header = CatchpointHeader {
            catchpoint: self.label,
            blocks_round: self.round,
            block_header_digest: self.block_header_digest,
            total_accounts: self.total_accounts,
        };
        let mut header_bytes = Vec::new();
        self.header_serializer.serialize(&header, &mut header_bytes)?;
        if let Some(mut builder) = self.tar_builder.take() {
            append_entry(&mut builder, CONTENT_ENTRY_NAME, &header_bytes)?;
            let encoder = builder.into_inner()?;
            let mut sink = encoder.finish()?;
            sink.flush()?;
        }
        info!(
            "catchpoint {} finalized: {} accounts in {} chunks",
            self.label, self.total_accounts, self.chunk_count
        );
        Ok(())
    }
}

/// Append one named entry to the archive with deterministic metadata
fn append_entry(builder: &mut TarSink, name: &str, data: &[u8]) -> Result<(), CatchpointError> {
    let mut header = tar::Header::new_gnu();
    header.set_path(name)?;
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();
    builder.append(&header, data)?;
    Ok(())
}
