//! Per-user selection frequencies keyed by (context, word).
//!
//! [`FrequencyTable`] is the plain in-memory map. [`FrequencyStore`] wraps it
//! behind a single `RwLock` and owns the durable backing: a checkpoint file
//! plus an append-only journal written by a background flusher, so callers
//! on the input thread only ever touch memory.

mod exchange;
mod flusher;
mod persistence;
pub mod wal;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::settings::FrequencySettings;

pub use exchange::ImportMode;
use flusher::Flusher;
use wal::{FrequencyWal, WalEntry};

pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub score: u64,
    /// Epoch seconds of the last update.
    pub last_used: u64,
}

/// Flat (context, word) record used for snapshots, checkpoints and TSV exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRecord {
    pub context: String,
    pub word: String,
    pub score: u64,
    pub last_used: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt frequency file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("frequency store is unavailable")]
    Unavailable,
}

#[derive(Clone, Default)]
pub struct FrequencyTable {
    /// context → (word → FrequencyEntry)
    entries: HashMap<String, HashMap<String, FrequencyEntry>>,
    /// Sequence number of the last journaled increment.
    seq: u64,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, context: &str, word: &str) -> u64 {
        self.entry(context, word).map_or(0, |e| e.score)
    }

    pub fn entry(&self, context: &str, word: &str) -> Option<FrequencyEntry> {
        self.entries
            .get(context)
            .and_then(|inner| inner.get(word))
            .copied()
    }

    /// Create-or-update an entry. Returns the new score.
    pub fn increment_at(&mut self, context: &str, word: &str, amount: u64, now: u64) -> u64 {
        let entry = self
            .entries
            .entry(context.to_string())
            .or_default()
            .entry(word.to_string())
            .or_insert(FrequencyEntry {
                score: 0,
                last_used: now,
            });
        entry.score = entry.score.saturating_add(amount);
        entry.last_used = entry.last_used.max(now);
        entry.score
    }

    pub fn set_at(&mut self, context: &str, word: &str, score: u64, now: u64) {
        self.entries
            .entry(context.to_string())
            .or_default()
            .insert(
                word.to_string(),
                FrequencyEntry {
                    score,
                    last_used: now,
                },
            );
    }

    pub fn remove(&mut self, context: &str, word: &str) -> bool {
        let Some(inner) = self.entries.get_mut(context) else {
            return false;
        };
        let removed = inner.remove(word).is_some();
        if inner.is_empty() {
            self.entries.remove(context);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|inner| inner.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Learned words of one context, score descending then word ascending.
    pub fn top_for_context(&self, context: &str, limit: usize) -> Vec<(String, u64)> {
        let Some(inner) = self.entries.get(context) else {
            return Vec::new();
        };
        let mut words: Vec<(String, u64)> = inner
            .iter()
            .map(|(word, e)| (word.clone(), e.score))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(limit);
        words
    }

    /// Entries across all contexts with `score >= min_score`, highest first.
    pub fn high_frequency(&self, min_score: u64, limit: usize) -> Vec<FrequencyRecord> {
        let mut records: Vec<FrequencyRecord> = self
            .records()
            .into_iter()
            .filter(|r| r.score >= min_score)
            .collect();
        records.truncate(limit);
        records
    }

    /// Drop every entry scoring below `min_score`. Returns the number removed.
    pub fn prune_below(&mut self, min_score: u64) -> usize {
        self.retain(|e| e.score >= min_score)
    }

    /// Drop every entry not used within `max_age_secs` of `now`.
    pub fn prune_unused(&mut self, max_age_secs: u64, now: u64) -> usize {
        let cutoff = now.saturating_sub(max_age_secs);
        self.retain(|e| e.last_used >= cutoff)
    }

    /// All entries, score descending then (context, word) ascending.
    pub fn records(&self) -> Vec<FrequencyRecord> {
        let mut records = Vec::with_capacity(self.len());
        for (context, inner) in &self.entries {
            for (word, entry) in inner {
                records.push(FrequencyRecord {
                    context: context.clone(),
                    word: word.clone(),
                    score: entry.score,
                    last_used: entry.last_used,
                });
            }
        }
        records.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.context.cmp(&b.context))
                .then_with(|| a.word.cmp(&b.word))
        });
        records
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Apply a replayed journal entry unless the checkpoint already covers it.
    pub(crate) fn apply_journal(&mut self, entry: &WalEntry) -> bool {
        if entry.seq <= self.seq {
            return false;
        }
        self.increment_at(&entry.context, &entry.word, entry.amount, entry.timestamp);
        self.seq = entry.seq;
        true
    }

    fn retain(&mut self, keep: impl Fn(&FrequencyEntry) -> bool) -> usize {
        let before = self.len();
        for inner in self.entries.values_mut() {
            inner.retain(|_, e| keep(e));
        }
        self.entries.retain(|_, inner| !inner.is_empty());
        before - self.len()
    }
}

enum Backing {
    Memory,
    Durable { path: PathBuf, flusher: Flusher },
    Unavailable,
}

/// Thread-safe frequency store shared by the merge engine and the recorder.
///
/// Reads take the read lock, mutations the write lock. When the backing is
/// unavailable, reads return 0 and writes are dropped.
pub struct FrequencyStore {
    table: Arc<RwLock<FrequencyTable>>,
    backing: Backing,
}

impl FrequencyStore {
    pub fn in_memory() -> Self {
        Self {
            table: Arc::new(RwLock::new(FrequencyTable::new())),
            backing: Backing::Memory,
        }
    }

    /// A store whose backing could not be opened.
    pub fn unavailable() -> Self {
        Self {
            table: Arc::new(RwLock::new(FrequencyTable::new())),
            backing: Backing::Unavailable,
        }
    }

    /// Open the checkpoint at `path`, replay its journal and start the
    /// background flusher.
    pub fn open(path: &Path, settings: &FrequencySettings) -> Result<Self, StoreError> {
        let mut table = FrequencyTable::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
            _ => StoreError::Io(e),
        })?;
        let checkpoint_seq = table.seq();
        let mut wal = FrequencyWal::new(path);
        let replayed = wal.replay(&mut table)?;
        debug!(
            path = %path.display(),
            entries = table.len(),
            replayed,
            "frequency store opened"
        );

        let table = Arc::new(RwLock::new(table));
        let flusher = Flusher::spawn(
            Arc::clone(&table),
            wal,
            checkpoint_seq,
            settings.journal_compact_threshold,
        )?;
        Ok(Self {
            table,
            backing: Backing::Durable {
                path: path.to_path_buf(),
                flusher,
            },
        })
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backing, Backing::Unavailable)
    }

    /// Checkpoint path when the store is durable.
    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::Durable { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn get(&self, context: &str, word: &str) -> u64 {
        self.read_table().map_or(0, |t| t.get(context, word))
    }

    pub fn entry(&self, context: &str, word: &str) -> Option<FrequencyEntry> {
        self.read_table().and_then(|t| t.entry(context, word))
    }

    /// Scores of several words in one context under a single read lock.
    pub fn scores<S: AsRef<str>>(&self, context: &str, words: &[S]) -> Vec<u64> {
        match self.read_table() {
            Some(t) => words.iter().map(|w| t.get(context, w.as_ref())).collect(),
            None => vec![0; words.len()],
        }
    }

    pub fn increment(&self, context: &str, word: &str, amount: u64) {
        self.increment_at(context, word, amount, now_epoch());
    }

    pub fn increment_at(&self, context: &str, word: &str, amount: u64, now: u64) {
        let Some(mut table) = self.write_table() else {
            debug!(context, word, "increment dropped");
            return;
        };
        table.increment_at(context, word, amount, now);
        let seq = table.next_seq();
        // Journal frames must reach the flusher in sequence order; replay
        // skips anything at or below the last applied seq.
        if let Backing::Durable { flusher, .. } = &self.backing {
            flusher.append(WalEntry {
                seq,
                context: context.to_string(),
                word: word.to_string(),
                amount,
                timestamp: now,
            });
        }
    }

    pub fn set(&self, context: &str, word: &str, score: u64) {
        self.mutate(|t| t.set_at(context, word, score, now_epoch()));
    }

    pub fn remove(&self, context: &str, word: &str) -> bool {
        self.mutate(|t| t.remove(context, word)).unwrap_or(false)
    }

    pub fn clear(&self) {
        self.mutate(FrequencyTable::clear);
    }

    pub fn len(&self) -> usize {
        self.read_table().map_or(0, |t| t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn top_for_context(&self, context: &str, limit: usize) -> Vec<(String, u64)> {
        self.read_table()
            .map(|t| t.top_for_context(context, limit))
            .unwrap_or_default()
    }

    pub fn high_frequency(&self, min_score: u64, limit: usize) -> Vec<FrequencyRecord> {
        self.read_table()
            .map(|t| t.high_frequency(min_score, limit))
            .unwrap_or_default()
    }

    pub fn prune_below(&self, min_score: u64) -> usize {
        self.mutate(|t| t.prune_below(min_score)).unwrap_or(0)
    }

    pub fn prune_unused(&self, max_age_secs: u64, now: u64) -> usize {
        self.mutate(|t| t.prune_unused(max_age_secs, now))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> Vec<FrequencyRecord> {
        self.read_table().map(|t| t.records()).unwrap_or_default()
    }

    pub fn export_tsv<W: Write>(&self, writer: W) -> Result<usize, StoreError> {
        let records = self.read_table().ok_or(StoreError::Unavailable)?.records();
        Ok(exchange::write_tsv(&records, writer)?)
    }

    pub fn import_tsv<R: BufRead>(&self, reader: R, mode: ImportMode) -> Result<usize, StoreError> {
        let records = exchange::read_tsv(reader)?;
        self.mutate(|t| exchange::import_records(t, records, mode))
            .ok_or(StoreError::Unavailable)
    }

    /// Write a checkpoint now and wait for it.
    pub fn flush(&self) -> Result<(), StoreError> {
        match &self.backing {
            Backing::Durable { flusher, .. } => Ok(flusher.checkpoint_blocking()?),
            Backing::Memory => Ok(()),
            Backing::Unavailable => Err(StoreError::Unavailable),
        }
    }

    /// Drain the journal, write a final checkpoint and stop the flusher.
    pub fn close(mut self) -> Result<(), StoreError> {
        match std::mem::replace(&mut self.backing, Backing::Memory) {
            Backing::Durable { mut flusher, .. } => Ok(flusher.shutdown()?),
            Backing::Memory => Ok(()),
            Backing::Unavailable => Err(StoreError::Unavailable),
        }
    }

    fn read_table(&self) -> Option<RwLockReadGuard<'_, FrequencyTable>> {
        if !self.is_available() {
            return None;
        }
        match self.table.read() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!("frequency table lock poisoned, reading as empty");
                None
            }
        }
    }

    fn write_table(&self) -> Option<RwLockWriteGuard<'_, FrequencyTable>> {
        if !self.is_available() {
            return None;
        }
        match self.table.write() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!("frequency table lock poisoned, dropping write");
                None
            }
        }
    }

    /// Administrative mutation: bypasses the journal and asks for a checkpoint.
    fn mutate<T>(&self, f: impl FnOnce(&mut FrequencyTable) -> T) -> Option<T> {
        let result = {
            let mut table = self.write_table()?;
            f(&mut table)
        };
        if let Backing::Durable { flusher, .. } = &self.backing {
            flusher.request_checkpoint();
        }
        Some(result)
    }
}
